use std::fmt;

use crate::types::{LogMap, Player, SubPhase, Username, REVEAL_LOG_KEY};

/// One projected log entry with the attribution the room view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// 1-based roster seat of the attributed player.
    pub seat: usize,
    pub username: Username,
    pub role_name: Option<String>,
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role_name {
            Some(role) => write!(
                f,
                "player {}-{} ({}): {}",
                self.seat, self.username, role, self.text
            ),
            None => write!(f, "player {}-{}: {}", self.seat, self.username, self.text),
        }
    }
}

/// Project the shared log map into what one viewer may see. Outside the
/// Resolution sub-phase that is the viewer's own entries and nothing else;
/// during Resolution it is every player's entries filed under the public
/// reveal key, never raw night-action detail. Pure: same inputs, same lines.
pub fn project_logs(
    logs: &LogMap,
    players: &[Player],
    viewer: &str,
    sub_phase: &SubPhase,
) -> Vec<LogLine> {
    if *sub_phase == SubPhase::Resolution {
        players
            .iter()
            .flat_map(|player| {
                logs.get(&player.username)
                    .and_then(|keyed| keyed.get(REVEAL_LOG_KEY))
                    .into_iter()
                    .flatten()
                    .map(|text| attribute(players, &player.username, text))
            })
            .collect()
    } else {
        logs.get(viewer)
            .into_iter()
            .flat_map(|keyed| keyed.values().flatten())
            .map(|text| attribute(players, viewer, text))
            .collect()
    }
}

fn attribute(players: &[Player], username: &str, text: &str) -> LogLine {
    let seat = players
        .iter()
        .position(|p| p.username == username)
        .map(|i| i + 1)
        .unwrap_or(0);
    let role_name = players
        .iter()
        .find(|p| p.username == username)
        .and_then(|p| p.initial_role.as_ref())
        .map(|r| r.name.clone());
    LogLine {
        seat,
        username: username.to_string(),
        role_name,
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Player, Role};
    use std::collections::BTreeMap;

    fn seated(username: &str, role_name: &str) -> Player {
        let role = Role {
            name: role_name.to_string(),
            faction: String::new(),
            count: 1,
            description: String::new(),
            img: String::new(),
            abilities: Vec::new(),
            phase: role_name.to_string(),
        };
        Player {
            id: format!("c-{username}"),
            username: username.to_string(),
            offline: false,
            avatar: None,
            role: Some(role.clone()),
            initial_role: Some(role),
            has_voted: false,
        }
    }

    fn log_map(entries: &[(&str, &str, &[&str])]) -> LogMap {
        let mut logs = LogMap::new();
        for (username, key, lines) in entries {
            logs.entry((*username).to_string())
                .or_insert_with(BTreeMap::new)
                .insert(
                    (*key).to_string(),
                    lines.iter().map(|l| (*l).to_string()).collect(),
                );
        }
        logs
    }

    #[test]
    fn players_only_see_their_own_entries_before_resolution() {
        let players = vec![seated("alice", "seer"), seated("bob", "werewolf")];
        let logs = log_map(&[
            ("alice", "0", &["you viewed bob's card"]),
            ("bob", "0", &["you saw no other werewolf"]),
        ]);

        let alice = project_logs(&logs, &players, "alice", &SubPhase::Role("seer".into()));
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].username, "alice");
        assert_eq!(alice[0].text, "you viewed bob's card");

        let bob = project_logs(&logs, &players, "bob", &SubPhase::Discussion);
        assert!(bob.iter().all(|line| line.username == "bob"));
        assert!(!bob.iter().any(|line| line.text.contains("viewed")));
    }

    #[test]
    fn resolution_reveals_only_the_public_key() {
        let players = vec![seated("alice", "seer"), seated("bob", "werewolf")];
        let logs = log_map(&[
            ("alice", "0", &["you viewed bob's card"]),
            ("alice", REVEAL_LOG_KEY, &["alice claimed seer"]),
            ("bob", REVEAL_LOG_KEY, &["bob stayed silent"]),
        ]);

        let lines = project_logs(&logs, &players, "carol", &SubPhase::Resolution);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["alice claimed seer", "bob stayed silent"]);
        // Raw night-action detail never leaks at reveal.
        assert!(!texts.contains(&"you viewed bob's card"));
    }

    #[test]
    fn entries_keep_insertion_order() {
        let players = vec![seated("alice", "robber")];
        let logs = log_map(&[(
            "alice",
            "0",
            &["you robbed bob", "you are now the werewolf"],
        )]);

        let lines = project_logs(&logs, &players, "alice", &SubPhase::Role("robber".into()));
        assert_eq!(
            lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(),
            vec!["you robbed bob", "you are now the werewolf"]
        );
    }

    #[test]
    fn projection_is_idempotent() {
        let players = vec![seated("alice", "seer"), seated("bob", "werewolf")];
        let logs = log_map(&[
            ("alice", "0", &["entry"]),
            ("bob", REVEAL_LOG_KEY, &["public"]),
        ]);

        for sub_phase in [SubPhase::Role("seer".into()), SubPhase::Resolution] {
            let first = project_logs(&logs, &players, "alice", &sub_phase);
            let second = project_logs(&logs, &players, "alice", &sub_phase);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn attribution_includes_seat_and_initial_role() {
        let players = vec![seated("alice", "seer"), seated("bob", "werewolf")];
        let logs = log_map(&[("bob", REVEAL_LOG_KEY, &["public note"])]);

        let lines = project_logs(&logs, &players, "alice", &SubPhase::Resolution);
        assert_eq!(lines[0].seat, 2);
        assert_eq!(lines[0].role_name.as_deref(), Some("werewolf"));
        assert_eq!(
            lines[0].to_string(),
            "player 2-bob (werewolf): public note"
        );
    }
}
