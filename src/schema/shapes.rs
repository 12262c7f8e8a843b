//! Source shapes of API objects whose field count varies between records
//!
//! Monster objects gained `pdx_id` and `us_id` with the BAO collaboration;
//! older records never had them back-filled. Each shape lists the primary
//! positions that have no source value and get the `-1` sentinel.

use super::tables::MONSTERS;

/// Position of the awoken skill list in a monster object
pub const MONSTER_AWOKEN_SKILLS: usize = 1;

/// Primary position of `pdx_id` in the monster record
pub const MONSTER_PDX_ID: usize = 10;

/// Primary position of `us_id` in the monster record
pub const MONSTER_US_ID: usize = 13;

/// Field count of a leader skill without a multiplier group
pub const LEADER_SKILL_PLAIN_LEN: usize = 2;

/// Field count of a leader skill with a multiplier group
pub const LEADER_SKILL_WITH_DATA_LEN: usize = 3;

/// One known layout of a source object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceShape {
    pub name: &'static str,
    /// Number of values in the source object
    pub field_count: usize,
    /// Primary positions with no source value, filled with -1
    pub defaulted: &'static [usize],
}

impl SourceShape {
    pub fn is_defaulted(&self, position: usize) -> bool {
        self.defaulted.contains(&position)
    }
}

pub static MONSTER_LEGACY: SourceShape = SourceShape {
    name: "legacy",
    field_count: 32,
    defaulted: &[MONSTER_PDX_ID, MONSTER_US_ID],
};

pub static MONSTER_BAO_COLLAB: SourceShape = SourceShape {
    name: "bao_collab",
    field_count: 34,
    defaulted: &[],
};

pub static MONSTER_SHAPES: &[&SourceShape] = &[&MONSTER_LEGACY, &MONSTER_BAO_COLLAB];

/// Find the monster shape matching a source object's field count
pub fn monster_shape(field_count: usize) -> Option<&'static SourceShape> {
    MONSTER_SHAPES
        .iter()
        .find(|shape| shape.field_count == field_count)
        .copied()
}

/// Number of primary fields every monster shape must produce
pub fn monster_record_len() -> usize {
    MONSTERS.fields.len()
}
