use serde::{Deserialize, Serialize};

use super::{PisteColor, PisteId};

/// A marked run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piste {
    pub id: Option<PisteId>,
    pub name: String,
    pub color: PisteColor,
    /// Length in metres
    pub length_m: i32,
    /// Average slope in percent
    pub slope: i32,
}
