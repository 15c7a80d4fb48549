//! Visit prioritisation: a 0..=100 urgency score per patient and the daily
//! roster built from it.

pub mod roster;
pub mod urgency;

pub use roster::{build_roster, suggest_route, DailyRoster, RosterEntry, RouteStop, VisitRoute};
pub use urgency::{collect_inputs, priority_level, score_urgency, UrgencyInputs, UrgencyScore};
