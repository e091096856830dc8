use thiserror::Error;

use crate::types::{GameState, MajorPhase, SubPhase};

/// May this player act right now? True only while the game is running at
/// Night, the sub-phase names the player's dealt role, and that role still
/// has a usable ability. Advisory: the server remains the sole authority.
pub fn can_act(game: &GameState, username: &str) -> bool {
    if !game.started || game.major_phase != MajorPhase::Night {
        return false;
    }
    let SubPhase::Role(acting_role) = &game.sub_phase else {
        return false;
    };
    let Some(initial) = game.player(username).and_then(|p| p.initial_role.as_ref()) else {
        return false;
    };
    initial.name == *acting_role && initial.has_night_ability()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteGate {
    #[error("you have already voted; check the game log and wait for the other players")]
    AlreadyVoted,
    #[error("voting is not open")]
    NotVoting,
    #[error("you are not seated in this game")]
    NotSeated,
}

/// May this player vote right now?
pub fn can_vote(game: &GameState, username: &str) -> Result<(), VoteGate> {
    if !game.started || game.sub_phase != SubPhase::Voting {
        return Err(VoteGate::NotVoting);
    }
    match game.player(username) {
        Some(p) if p.has_voted => Err(VoteGate::AlreadyVoted),
        Some(_) => Ok(()),
        None => Err(VoteGate::NotSeated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Ability, MajorPhase, Player, Role, SubPhase, TargetKind,
    };

    fn ability(name: &str, slots: &[TargetKind]) -> Ability {
        Ability {
            name: name.to_string(),
            max_uses: 1,
            target_slots: slots.to_vec(),
            allow_self: false,
        }
    }

    fn role_with(name: &str, abilities: Vec<Ability>) -> Role {
        Role {
            name: name.to_string(),
            faction: String::new(),
            count: 1,
            description: String::new(),
            img: String::new(),
            abilities,
            phase: name.to_string(),
        }
    }

    fn seated(username: &str, initial: Role) -> Player {
        Player {
            id: format!("c-{username}"),
            username: username.to_string(),
            offline: false,
            avatar: None,
            role: Some(initial.clone()),
            initial_role: Some(initial),
            has_voted: false,
        }
    }

    fn game(sub_phase: SubPhase, players: Vec<Player>) -> GameState {
        GameState {
            started: true,
            major_phase: match sub_phase {
                SubPhase::Role(_) => MajorPhase::Night,
                _ => MajorPhase::Day,
            },
            sub_phase,
            players,
            pre_roles: Vec::new(),
            leftover_cards: Vec::new(),
            logs: Default::default(),
            vote_results: Vec::new(),
            winner: None,
            discussion_info: Default::default(),
            cur_action_time: 0,
        }
    }

    #[test]
    fn acting_requires_matching_initial_role() {
        let seer = role_with("seer", vec![ability("view", &[TargetKind::Player])]);
        let villager = role_with("villager", Vec::new());
        let state = game(
            SubPhase::Role("seer".into()),
            vec![seated("alice", seer), seated("bob", villager)],
        );

        assert!(can_act(&state, "alice"));
        assert!(!can_act(&state, "bob"));
        assert!(!can_act(&state, "nobody"));
    }

    #[test]
    fn acting_is_night_only_and_needs_a_usable_ability() {
        let mut spent = role_with("seer", vec![ability("view", &[TargetKind::Player])]);
        spent.abilities[0].max_uses = 0;
        let state = game(SubPhase::Role("seer".into()), vec![seated("alice", spent)]);
        assert!(!can_act(&state, "alice"));

        let seer = role_with("seer", vec![ability("view", &[TargetKind::Player])]);
        let mut day = game(SubPhase::Voting, vec![seated("alice", seer)]);
        assert!(!can_act(&day, "alice"));

        day.started = false;
        assert!(!can_act(&day, "alice"));
    }

    #[test]
    fn voting_blocks_a_second_ballot() {
        let villager = role_with("villager", Vec::new());
        let mut state = game(
            SubPhase::Voting,
            vec![seated("alice", villager.clone()), seated("bob", villager)],
        );

        assert_eq!(can_vote(&state, "alice"), Ok(()));
        state.players[0].has_voted = true;
        assert_eq!(can_vote(&state, "alice"), Err(VoteGate::AlreadyVoted));
        assert_eq!(can_vote(&state, "ghost"), Err(VoteGate::NotSeated));

        state.sub_phase = SubPhase::Discussion;
        assert_eq!(can_vote(&state, "bob"), Err(VoteGate::NotVoting));
    }

    #[test]
    fn gating_is_a_pure_function_of_the_snapshot() {
        let seer = role_with("seer", vec![ability("view", &[TargetKind::Player])]);
        let state = game(SubPhase::Role("seer".into()), vec![seated("alice", seer)]);
        let first = can_act(&state, "alice");
        let second = can_act(&state, "alice");
        assert_eq!(first, second);
        assert!(first);
    }
}
