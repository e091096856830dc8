use crate::gate;
use crate::protocol::{NightActionData, NightTarget};
use crate::types::{Ability, GameState, SubPhase, TargetKind};

/// A click against a targetable entity in the room view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click<'a> {
    Player(&'a str),
    Deck(usize),
}

impl Click<'_> {
    fn kind(&self) -> TargetKind {
        match self {
            Click::Player(_) => TargetKind::Player,
            Click::Deck(_) => TargetKind::Deck,
        }
    }

    fn target(&self) -> NightTarget {
        match self {
            Click::Player(name) => NightTarget::Player((*name).to_string()),
            Click::Deck(index) => NightTarget::Deck(*index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The click did not address the expected next slot; nothing changed.
    Ignored,
    /// The ability forbids targeting yourself; the composition is discarded.
    SelfTarget,
    /// Target recorded, more slots remain. Carries the count so far.
    Accumulated(usize),
    /// The sequence is complete: issue exactly one `nightAction` request.
    Flush {
        action: String,
        data: NightActionData,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Phase {
    #[default]
    Idle,
    Accumulating {
        ability: String,
        targets: Vec<NightTarget>,
    },
}

/// Accumulates ordered targets across independent clicks and emits one
/// composed request per completed ability invocation. Local-only state;
/// the authoritative snapshot is never consulted for what was clicked,
/// only for what may be clicked.
#[derive(Debug, Default)]
pub struct ActionComposer {
    phase: Phase,
    sub_phase: Option<SubPhase>,
    request_pending: bool,
}

impl ActionComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets recorded so far for the in-progress composition.
    pub fn pending_targets(&self) -> usize {
        match &self.phase {
            Phase::Idle => 0,
            Phase::Accumulating { targets, .. } => targets.len(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle && !self.request_pending
    }

    /// Feed one click through the machine. The gate is re-checked on every
    /// click because the snapshot may have been replaced since the last one.
    pub fn click(&mut self, game: &GameState, username: &str, click: Click<'_>) -> ClickOutcome {
        if self.request_pending {
            return ClickOutcome::Ignored;
        }
        if !gate::can_act(game, username) {
            return ClickOutcome::Ignored;
        }
        let Some(role) = game.player(username).and_then(|p| p.initial_role.as_ref()) else {
            return ClickOutcome::Ignored;
        };

        match std::mem::take(&mut self.phase) {
            Phase::Idle => self.first_click(&role.abilities, username, click),
            Phase::Accumulating { ability, targets } => {
                self.next_click(&role.abilities, ability, targets, username, click)
            }
        }
    }

    fn first_click(
        &mut self,
        abilities: &[Ability],
        username: &str,
        click: Click<'_>,
    ) -> ClickOutcome {
        for ability in abilities.iter().filter(|a| a.max_uses > 0) {
            // Self-only effect: no accumulation, flush on the trigger.
            if ability.target_slots.is_empty() {
                self.request_pending = true;
                return ClickOutcome::Flush {
                    action: ability.name.clone(),
                    data: NightActionData::default(),
                };
            }
            if ability.target_slots[0] != click.kind() {
                continue;
            }
            if Self::is_forbidden_self(ability, username, click) {
                return ClickOutcome::SelfTarget;
            }
            if ability.target_slots.len() == 1 {
                self.request_pending = true;
                return ClickOutcome::Flush {
                    action: ability.name.clone(),
                    data: NightActionData {
                        target1: Some(click.target()),
                        target2: None,
                    },
                };
            }
            self.phase = Phase::Accumulating {
                ability: ability.name.clone(),
                targets: vec![click.target()],
            };
            return ClickOutcome::Accumulated(1);
        }
        ClickOutcome::Ignored
    }

    fn next_click(
        &mut self,
        abilities: &[Ability],
        ability_name: String,
        mut targets: Vec<NightTarget>,
        username: &str,
        click: Click<'_>,
    ) -> ClickOutcome {
        // The role table was replaced since we started; drop the composition.
        let Some(ability) = abilities.iter().find(|a| a.name == ability_name) else {
            return ClickOutcome::Ignored;
        };

        if ability.target_slots.get(targets.len()) != Some(&click.kind()) {
            // No-op: keep accumulating with what we had.
            self.phase = Phase::Accumulating {
                ability: ability_name,
                targets,
            };
            return ClickOutcome::Ignored;
        }
        if Self::is_forbidden_self(ability, username, click) {
            return ClickOutcome::SelfTarget;
        }

        targets.push(click.target());
        if targets.len() < ability.target_slots.len() {
            let count = targets.len();
            self.phase = Phase::Accumulating {
                ability: ability_name,
                targets,
            };
            return ClickOutcome::Accumulated(count);
        }

        let mut drained = targets.into_iter();
        let data = NightActionData {
            target1: drained.next(),
            target2: drained.next(),
        };
        self.request_pending = true;
        ClickOutcome::Flush {
            action: ability_name,
            data,
        }
    }

    fn is_forbidden_self(ability: &Ability, username: &str, click: Click<'_>) -> bool {
        matches!(click, Click::Player(target) if target == username && !ability.allow_self)
    }

    /// Called on every authoritative game push. A sub-phase change while
    /// accumulating resets unconditionally; there is no carry-over across
    /// phase boundaries.
    pub fn note_sub_phase(&mut self, sub_phase: &SubPhase) {
        if self.sub_phase.as_ref() != Some(sub_phase) {
            self.sub_phase = Some(sub_phase.clone());
            self.phase = Phase::Idle;
            self.request_pending = false;
        }
    }

    /// The flushed request was acknowledged. A rejection discards whatever
    /// was being composed.
    pub fn finish_request(&mut self, accepted: bool) {
        self.request_pending = false;
        if !accepted {
            self.phase = Phase::Idle;
        }
    }

    /// Drop the in-progress composition, e.g. on an `actionDenied` push or a
    /// restart.
    pub fn discard(&mut self) {
        self.phase = Phase::Idle;
        self.request_pending = false;
        self.sub_phase = None;
    }
}
