//! Record layouts for all PADherder dataset tables

use std::fmt;

use super::types::*;

const ACTIVE_SKILL_NAME: FieldType = FieldType::Bytes(128);
const ACTIVE_SKILL_EFFECT: FieldType = FieldType::Bytes(128);
const AWAKENING_DESC: FieldType = FieldType::Bytes(96);
const AWAKENING_NAME: FieldType = FieldType::Bytes(40);
const LEADER_SKILL_EFFECT: FieldType = FieldType::Bytes(96);
const LEADER_SKILL_NAME: FieldType = FieldType::Bytes(40);
const CONSTRAINT_CODE: FieldType = FieldType::Bytes(4);
const MONSTER_NAME: FieldType = FieldType::Bytes(40);
const MONSTER_IMAGE: FieldType = FieldType::Bytes(40);

/// Maximum number of awoken skills a monster can carry
pub const MAX_AWOKEN_SKILLS: usize = 10;

/// Number of hp/atk/rcv multipliers in a leader skill
pub const MULTIPLIER_COUNT: usize = 3;

/// Number of numeric constraint arguments kept per leader skill
pub const CONSTRAINT_ARGS: usize = 3;

// =============================================================================
// Plain tables
// =============================================================================

pub static ACTIVE_SKILLS: RecordSchema = RecordSchema {
    name: "active_skills",
    fields: &[
        Field::new("min_cooldown", FieldType::UInt8),
        Field::new("effect", ACTIVE_SKILL_EFFECT),
        Field::new("max_cooldown", FieldType::UInt8),
        Field::new("name", ACTIVE_SKILL_NAME),
    ],
};

pub static AWAKENINGS: RecordSchema = RecordSchema {
    name: "awakenings",
    fields: &[
        Field::new("desc", AWAKENING_DESC),
        Field::new("id", FieldType::UInt8),
        Field::new("name", AWAKENING_NAME),
    ],
};

// =============================================================================
// Tables with a sublist
// =============================================================================

/// `data` is the row of the multipliers in the sublist, -1 when the skill has none
pub static LEADER_SKILLS: RecordSchema = RecordSchema {
    name: "leader_skills",
    fields: &[
        Field::new("data", FieldType::Int32),
        Field::new("effect", LEADER_SKILL_EFFECT),
        Field::new("name", LEADER_SKILL_NAME),
    ],
};

/// hp/atk/rcv multipliers plus the constraint ("type"/"elem" and up to three arguments)
pub static LEADER_SKILLS_SUBLIST: RecordSchema = RecordSchema {
    name: "leader_skills_sublist",
    fields: &[
        Field::new("har", FieldType::Array(&FieldType::Int8, MULTIPLIER_COUNT)),
        Field::new("con_str", CONSTRAINT_CODE),
        Field::new("con_num", FieldType::Array(&FieldType::Int8, CONSTRAINT_ARGS)),
    ],
};

pub static MONSTERS: RecordSchema = RecordSchema {
    name: "monsters",
    fields: &[
        Field::new("element2", FieldType::Int8),
        Field::new("awoken_skills", FieldType::Int32),
        Field::new("rcv_scale", FieldType::Float16),
        Field::new("id", FieldType::UInt16),
        Field::new("type3", FieldType::UInt8),
        Field::new("type2", FieldType::UInt8),
        Field::new("image40_href", MONSTER_IMAGE),
        Field::new("xp_curve", FieldType::UInt32),
        Field::new("leader_skill", LEADER_SKILL_NAME),
        Field::new("image40_size", FieldType::UInt16),
        Field::new("pdx_id", FieldType::UInt16),
        Field::new("version", FieldType::UInt16),
        Field::new("atk_min", FieldType::Int16),
        Field::new("us_id", FieldType::UInt16),
        Field::new("atk_max", FieldType::Int16),
        Field::new("jp_only", FieldType::Bool),
        Field::new("image60_size", FieldType::UInt16),
        Field::new("max_level", FieldType::UInt8),
        Field::new("image60_href", MONSTER_IMAGE),
        Field::new("monster_points", FieldType::UInt16),
        Field::new("rcv_min", FieldType::Int16),
        Field::new("rcv_max", FieldType::Int16),
        Field::new("hp_max", FieldType::UInt16),
        Field::new("hp_scale", FieldType::Float16),
        Field::new("name", MONSTER_NAME),
        Field::new("team_cost", FieldType::UInt8),
        Field::new("type", FieldType::UInt8),
        Field::new("hp_min", FieldType::UInt16),
        Field::new("name_jp", MONSTER_NAME),
        Field::new("rarity", FieldType::UInt8),
        Field::new("active_skill", ACTIVE_SKILL_NAME),
        Field::new("feed_xp", FieldType::Float32),
        Field::new("element", FieldType::UInt8),
        Field::new("atk_scale", FieldType::Float16),
    ],
};

pub static MONSTERS_SUBLIST: RecordSchema = RecordSchema {
    name: "monsters_sublist",
    fields: &[Field::new(
        "awoken_skills",
        FieldType::Array(&FieldType::Int8, MAX_AWOKEN_SKILLS),
    )],
};

// =============================================================================
// Registry
// =============================================================================

pub static ALL_SCHEMAS: &[&RecordSchema] = &[
    &ACTIVE_SKILLS,
    &AWAKENINGS,
    &LEADER_SKILLS,
    &LEADER_SKILLS_SUBLIST,
    &MONSTERS,
    &MONSTERS_SUBLIST,
];

/// Get a table schema by its key
pub fn get_schema(name: &str) -> Option<&'static RecordSchema> {
    ALL_SCHEMAS.iter().find(|s| s.name == name).copied()
}

/// All table keys, sublists included
pub fn table_names() -> Vec<&'static str> {
    ALL_SCHEMAS.iter().map(|s| s.name).collect()
}

/// One of the datasets served by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatasetKind {
    ActiveSkills,
    Awakenings,
    LeaderSkills,
    Monsters,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::ActiveSkills,
        DatasetKind::Awakenings,
        DatasetKind::LeaderSkills,
        DatasetKind::Monsters,
    ];

    /// Key used for the endpoint path and the primary table file
    pub fn key(&self) -> &'static str {
        self.schema().name
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn schema(&self) -> &'static RecordSchema {
        match self {
            DatasetKind::ActiveSkills => &ACTIVE_SKILLS,
            DatasetKind::Awakenings => &AWAKENINGS,
            DatasetKind::LeaderSkills => &LEADER_SKILLS,
            DatasetKind::Monsters => &MONSTERS,
        }
    }

    pub fn sublist_schema(&self) -> Option<&'static RecordSchema> {
        match self {
            DatasetKind::LeaderSkills => Some(&LEADER_SKILLS_SUBLIST),
            DatasetKind::Monsters => Some(&MONSTERS_SUBLIST),
            DatasetKind::ActiveSkills | DatasetKind::Awakenings => None,
        }
    }

    /// Key of the sublist table, e.g. `monsters_sublist`
    pub fn sublist_key(&self) -> Option<&'static str> {
        self.sublist_schema().map(|s| s.name)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_keys_round_trip() {
        for kind in DatasetKind::ALL {
            assert_eq!(DatasetKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(DatasetKind::from_key("users"), None);
    }

    #[test]
    fn test_sublist_keys() {
        assert_eq!(
            DatasetKind::LeaderSkills.sublist_key(),
            Some("leader_skills_sublist")
        );
        assert_eq!(DatasetKind::Monsters.sublist_key(), Some("monsters_sublist"));
        assert_eq!(DatasetKind::Awakenings.sublist_key(), None);
    }

    #[test]
    fn test_monster_layout() {
        assert_eq!(MONSTERS.fields.len(), 34);
        assert_eq!(MONSTERS.position("awoken_skills"), Some(1));
        assert_eq!(MONSTERS.position("pdx_id"), Some(10));
        assert_eq!(MONSTERS.position("us_id"), Some(13));
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(ACTIVE_SKILLS.record_size(), 258);
        assert_eq!(AWAKENINGS.record_size(), 137);
        assert_eq!(LEADER_SKILLS.record_size(), 140);
        assert_eq!(LEADER_SKILLS_SUBLIST.record_size(), 10);
        assert_eq!(MONSTERS_SUBLIST.record_size(), 10);
    }

    #[test]
    fn test_get_schema() {
        assert_eq!(get_schema("monsters_sublist").map(|s| s.name), Some("monsters_sublist"));
        assert!(get_schema("nope").is_none());
        assert_eq!(table_names().len(), 6);
    }
}
