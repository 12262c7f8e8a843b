//! Flattening of API objects into primary and sublist rows
//!
//! Every flattener takes the values of one object in key order. Plain
//! datasets keep them as they are. Leader skills and monsters move their
//! variable-length part into a sublist row and leave its index (or -1) in the
//! primary row.

use thiserror::Error;
use tracing::debug;

use super::allocator::SublistAllocator;
use super::record::{parse_records, RawRecord};
use super::value::Cell;
use crate::schema::{
    monster_record_len, monster_shape, DatasetKind, CONSTRAINT_ARGS, LEADER_SKILL_PLAIN_LEN,
    LEADER_SKILL_WITH_DATA_LEN, MAX_AWOKEN_SKILLS, MONSTER_AWOKEN_SKILLS, MULTIPLIER_COUNT,
};

/// A single object that cannot be flattened
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected {expected} values, found {found}")]
    FieldCount { expected: &'static str, found: usize },
    #[error("no known monster shape has {0} fields")]
    UnknownShape(usize),
    #[error("{field} should be a list, found {found}")]
    ExpectedList {
        field: &'static str,
        found: &'static str,
    },
    #[error("multiplier group has {0} values, expected 3 or 4")]
    MultiplierCount(usize),
    #[error("constraint has {0} arguments, at most {max} fit", max = CONSTRAINT_ARGS)]
    ConstraintTooLong(usize),
    #[error("{0} awoken skills, at most {max} fit", max = MAX_AWOKEN_SKILLS)]
    TooManyAwokenSkills(usize),
}

/// A dataset that cannot be flattened
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a list of objects, found {0}")]
    NotAList(&'static str),
    #[error("item {index} is a {found}, expected an object")]
    NotAnObject { index: usize, found: &'static str },
    #[error("record {index}: {error}")]
    Record { index: usize, error: RecordError },
    #[error("{kind}: {rows} sublist rows for {allocated} allocated indices")]
    SublistMismatch {
        kind: DatasetKind,
        rows: usize,
        allocated: usize,
    },
}

/// Result of flattening one object
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub primary: Vec<Cell>,
    pub sublist: Option<Vec<Cell>>,
}

/// All rows of one dataset pass
#[derive(Debug, Clone)]
pub struct FlattenedDataset {
    pub kind: DatasetKind,
    pub primary: Vec<Vec<Cell>>,
    pub sublist: Vec<Vec<Cell>>,
}

/// Constraint attached to a leader skill's multipliers
#[derive(Debug, Clone, PartialEq)]
enum Constraint {
    Absent,
    Present { code: Cell, args: Vec<Cell> },
}

/// hp/atk/rcv multipliers with an optional constraint
#[derive(Debug, Clone, PartialEq)]
struct MultiplierGroup {
    har: Vec<Cell>,
    constraint: Constraint,
}

impl MultiplierGroup {
    fn from_cell(cell: Cell) -> Result<Self, RecordError> {
        let mut items = match cell {
            Cell::List(items) => items,
            other => {
                return Err(RecordError::ExpectedList {
                    field: "data",
                    found: other.kind(),
                })
            }
        };

        if items.len() != MULTIPLIER_COUNT && items.len() != MULTIPLIER_COUNT + 1 {
            return Err(RecordError::MultiplierCount(items.len()));
        }

        let constraint = match items.get(MULTIPLIER_COUNT).cloned() {
            None | Some(Cell::Null) => Constraint::Absent,
            Some(Cell::List(parts)) => {
                let mut parts = parts.into_iter();
                match parts.next() {
                    None => Constraint::Absent,
                    Some(code) => {
                        let args: Vec<Cell> = parts.collect();
                        if args.len() > CONSTRAINT_ARGS {
                            return Err(RecordError::ConstraintTooLong(args.len()));
                        }
                        Constraint::Present { code, args }
                    }
                }
            }
            Some(other) => {
                return Err(RecordError::ExpectedList {
                    field: "constraint",
                    found: other.kind(),
                })
            }
        };

        items.truncate(MULTIPLIER_COUNT);
        Ok(Self {
            har: items,
            constraint,
        })
    }

    /// Row of `leader_skills_sublist`: har, con_str, con_num
    fn into_row(self) -> Vec<Cell> {
        let (code, args) = match self.constraint {
            Constraint::Absent => (Cell::text("-1"), Vec::new()),
            Constraint::Present { code, args } => (code, args),
        };
        vec![
            Cell::List(self.har),
            code,
            Cell::List(pad_with_sentinel(args, CONSTRAINT_ARGS)),
        ]
    }
}

fn pad_with_sentinel(mut cells: Vec<Cell>, len: usize) -> Vec<Cell> {
    cells.resize(len.max(cells.len()), Cell::SENTINEL);
    cells
}

/// Flatten an active skill or awakening: values as they are
pub fn flatten_plain(values: RawRecord) -> Flattened {
    Flattened {
        primary: values,
        sublist: None,
    }
}

/// Flatten a leader skill: `[data?, effect, name]`
pub fn flatten_leader_skill(
    mut values: RawRecord,
    alloc: &mut SublistAllocator,
) -> Result<Flattened, RecordError> {
    match values.len() {
        LEADER_SKILL_WITH_DATA_LEN => {
            let group = MultiplierGroup::from_cell(values.remove(0))?;
            let mut primary = Vec::with_capacity(LEADER_SKILL_WITH_DATA_LEN);
            primary.push(Cell::Int(alloc.allocate() as i64));
            primary.extend(values);
            Ok(Flattened {
                primary,
                sublist: Some(group.into_row()),
            })
        }
        LEADER_SKILL_PLAIN_LEN => {
            let mut primary = Vec::with_capacity(LEADER_SKILL_WITH_DATA_LEN);
            primary.push(Cell::SENTINEL);
            primary.extend(values);
            Ok(Flattened {
                primary,
                sublist: None,
            })
        }
        found => Err(RecordError::FieldCount {
            expected: "2 or 3",
            found,
        }),
    }
}

/// Row of `monsters_sublist`, or None for a monster without awoken skills
fn awoken_skill_row(cell: Cell) -> Result<Option<Vec<Cell>>, RecordError> {
    let skills = match cell {
        Cell::List(skills) => skills,
        other => {
            return Err(RecordError::ExpectedList {
                field: "awoken_skills",
                found: other.kind(),
            })
        }
    };

    if skills.is_empty() {
        return Ok(None);
    }
    if skills.len() > MAX_AWOKEN_SKILLS {
        return Err(RecordError::TooManyAwokenSkills(skills.len()));
    }

    let skills = skills.into_iter().map(Cell::or_sentinel).collect();
    Ok(Some(vec![Cell::List(pad_with_sentinel(
        skills,
        MAX_AWOKEN_SKILLS,
    ))]))
}

/// Flatten a monster, filling ids missing from older records with -1
pub fn flatten_monster(
    values: RawRecord,
    alloc: &mut SublistAllocator,
) -> Result<Flattened, RecordError> {
    let found = values.len();
    let shape = monster_shape(found).ok_or(RecordError::UnknownShape(found))?;

    let mut source = values.into_iter();
    let mut primary = Vec::with_capacity(monster_record_len());
    let mut sublist = None;

    for position in 0..monster_record_len() {
        if shape.is_defaulted(position) {
            primary.push(Cell::SENTINEL);
            continue;
        }

        let value = source.next().ok_or(RecordError::FieldCount {
            expected: shape.name,
            found,
        })?;

        if position == MONSTER_AWOKEN_SKILLS {
            match awoken_skill_row(value)? {
                Some(row) => {
                    primary.push(Cell::Int(alloc.allocate() as i64));
                    sublist = Some(row);
                }
                None => primary.push(Cell::SENTINEL),
            }
        } else {
            primary.push(value.or_sentinel());
        }
    }

    Ok(Flattened { primary, sublist })
}

/// Flatten one object with the flattener for its dataset kind
pub fn flatten_record(
    kind: DatasetKind,
    values: RawRecord,
    alloc: &mut SublistAllocator,
) -> Result<Flattened, RecordError> {
    match kind {
        DatasetKind::ActiveSkills | DatasetKind::Awakenings => Ok(flatten_plain(values)),
        DatasetKind::LeaderSkills => flatten_leader_skill(values, alloc),
        DatasetKind::Monsters => flatten_monster(values, alloc),
    }
}

/// Flatten every object of a dataset, resetting `alloc` once the pass ends
pub fn flatten_dataset(
    kind: DatasetKind,
    records: Vec<RawRecord>,
    alloc: &mut SublistAllocator,
) -> Result<FlattenedDataset, FlattenError> {
    let result = flatten_pass(kind, records, alloc);
    alloc.reset();
    result
}

fn flatten_pass(
    kind: DatasetKind,
    records: Vec<RawRecord>,
    alloc: &mut SublistAllocator,
) -> Result<FlattenedDataset, FlattenError> {
    let mut primary = Vec::with_capacity(records.len());
    let mut sublist = Vec::new();

    for (index, values) in records.into_iter().enumerate() {
        let flattened = flatten_record(kind, values, alloc)
            .map_err(|error| FlattenError::Record { index, error })?;
        primary.push(flattened.primary);
        if let Some(row) = flattened.sublist {
            sublist.push(row);
        }
    }

    if sublist.len() != alloc.count() {
        return Err(FlattenError::SublistMismatch {
            kind,
            rows: sublist.len(),
            allocated: alloc.count(),
        });
    }

    debug!(
        "{}: flattened {} records, {} sublist rows",
        kind,
        primary.len(),
        sublist.len()
    );

    Ok(FlattenedDataset {
        kind,
        primary,
        sublist,
    })
}

/// Parse and flatten a response body
pub fn flatten_body(
    kind: DatasetKind,
    body: &str,
    alloc: &mut SublistAllocator,
) -> Result<FlattenedDataset, FlattenError> {
    flatten_dataset(kind, parse_records(body)?, alloc)
}
