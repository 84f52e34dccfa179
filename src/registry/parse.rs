//! Annotation parsing: record field tables to entity descriptors

use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};
use crate::introspect::{walk_fields, FieldEntry};
use crate::naming::snake_case;
use crate::record::{FieldInfo, Record, RecordType};
use crate::relation::{
    BelongsTo, BelongsToMany, BelongsToManyIds, HasMany, HasOne, Relation, RelationKind,
};
use crate::tag::Tag;

const OPTION_TOKENS: [&str; 7] = [
    "relation_name",
    "sql_id_field",
    "sql_other_id_field",
    "join_name",
    "pk",
    "auto_incr",
    "version",
];

/// Parse the annotations of `R` into a descriptor without registering it
///
/// The logical (and initial storage) name is `name`, or the snake_case type name.
pub fn parse_descriptor<R: Record>(name: Option<&str>) -> Result<EntityDescriptor> {
    parse_fields(R::record_type(), R::fields(), name)
}

pub(crate) fn parse_fields(
    record_type: RecordType,
    fields: &'static [FieldInfo],
    name: Option<&str>,
) -> Result<EntityDescriptor> {
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| snake_case(record_type.name()));
    let mut desc = EntityDescriptor::from_parts(record_type, fields, name);

    let entries: Vec<(FieldEntry, Tag)> = walk_fields(fields)
        .into_iter()
        .map(|entry| {
            let tag = Tag::parse(entry.info.tag);
            (entry, tag)
        })
        .collect();

    for (entry, tag) in &entries {
        validate_tokens(desc.name(), entry.info, tag)?;
    }

    // Keys first: join-table relations default to the first key column.
    let mut version_field: Option<&str> = None;
    for (entry, tag) in &entries {
        let Some(column) = entry.info.column else {
            continue;
        };
        if tag.has("pk") {
            desc.push_key_field(column);
            if tag.has("auto_incr") {
                desc.set_key_auto_generated(true);
            }
            continue;
        }
        if tag.has("auto_incr") {
            return Err(Error::config(
                desc.name(),
                format!("field `{}` is auto_incr but not pk", entry.info.name),
            ));
        }
        if tag.has("version") {
            if let Some(previous) = version_field {
                return Err(Error::config(
                    desc.name(),
                    format!("both `{previous}` and `{column}` are marked version"),
                ));
            }
            version_field = Some(column);
        }
    }
    desc.set_version_field(version_field.map(str::to_string));

    if desc.key_fields().is_empty() {
        return Err(Error::config(desc.name(), "no primary key fields found for type"));
    }

    for (entry, tag) in &entries {
        if let Some(relation) = parse_relation(&desc, entry.info, tag)? {
            desc.add_relation(relation);
        }
    }

    Ok(desc)
}

fn validate_tokens(entity: &str, info: &FieldInfo, tag: &Tag) -> Result<()> {
    for key in tag.keys() {
        if RelationKind::from_token(key).is_none() && !OPTION_TOKENS.contains(&key) {
            return Err(Error::config(
                entity,
                format!("unknown token `{key}` on field `{}`", info.name),
            ));
        }
    }
    Ok(())
}

fn parse_relation(
    desc: &EntityDescriptor,
    info: &FieldInfo,
    tag: &Tag,
) -> Result<Option<Relation>> {
    let kinds: Vec<RelationKind> = RelationKind::ALL
        .into_iter()
        .filter(|kind| tag.has(kind.token()))
        .collect();
    let kind = match kinds.as_slice() {
        [] => return Ok(None),
        [kind] => *kind,
        _ => {
            return Err(Error::config(
                desc.name(),
                format!(
                    "field `{}` declares more than one relation kind: {}",
                    info.name,
                    kinds.iter().map(|k| k.token()).collect::<Vec<_>>().join(", ")
                ),
            ))
        }
    };

    let field_name = snake_case(info.name);
    let name = tag.get("relation_name").map_or_else(|| field_name.clone(), str::to_string);
    let value_field = info.name.to_string();

    let relation = match kind {
        RelationKind::BelongsTo => Relation::BelongsTo(BelongsTo {
            sql_id_field: tag
                .get("sql_id_field")
                .map_or_else(|| format!("{field_name}_id"), str::to_string),
            name,
            value_field,
        }),
        RelationKind::HasMany => Relation::HasMany(HasMany {
            sql_other_id_field: other_side_key(desc, tag),
            name,
            value_field,
        }),
        RelationKind::HasOne => Relation::HasOne(HasOne {
            sql_other_id_field: other_side_key(desc, tag),
            name,
            value_field,
        }),
        RelationKind::BelongsToMany | RelationKind::BelongsToManyIds => {
            let link = JoinLink::parse(desc, kind, &name, tag)?;
            if kind == RelationKind::BelongsToMany {
                Relation::BelongsToMany(BelongsToMany {
                    name,
                    value_field,
                    join_name: link.join_name,
                    sql_id_field: link.sql_id_field,
                    sql_other_id_field: link.sql_other_id_field,
                })
            } else {
                Relation::BelongsToManyIds(BelongsToManyIds {
                    name,
                    value_field,
                    join_name: link.join_name,
                    sql_id_field: link.sql_id_field,
                    sql_other_id_field: link.sql_other_id_field,
                })
            }
        }
    };
    Ok(Some(relation))
}

fn other_side_key(desc: &EntityDescriptor, tag: &Tag) -> String {
    tag.get("sql_other_id_field")
        .map_or_else(|| format!("{}_id", desc.name()), str::to_string)
}

struct JoinLink {
    join_name: String,
    sql_id_field: String,
    sql_other_id_field: String,
}

impl JoinLink {
    fn parse(
        desc: &EntityDescriptor,
        kind: RelationKind,
        relation: &str,
        tag: &Tag,
    ) -> Result<Self> {
        let join_name = tag.get("join_name").ok_or_else(|| {
            Error::config(
                desc.name(),
                format!("`join_name` not specified for {kind} relation {relation:?}"),
            )
        })?;
        let sql_id_field = match tag.get("sql_id_field") {
            Some(field) => field.to_string(),
            None => desc.primary_key()?.to_string(),
        };
        let sql_other_id_field = match tag.get("sql_other_id_field") {
            Some(field) => field.to_string(),
            None => guess_other_id_field(join_name, desc.name()).ok_or_else(|| {
                Error::config(
                    desc.name(),
                    format!(
                        "`sql_other_id_field` is required for relation {relation:?}, \
                         unable to guess its value from join name `{join_name}`"
                    ),
                )
            })?,
        };
        Ok(Self {
            join_name: join_name.to_string(),
            sql_id_field,
            sql_other_id_field,
        })
    }
}

/// Guess the join column for the other side from the join entity's name
///
/// Removes the first occurrence of `entity` from `join_name`, trims underscores and
/// appends `_id`: `book` + `book_category` gives `category_id`. This is a plain
/// substring heuristic, so a name that occurs twice or inside another word is stripped
/// at its first position. Returns `None` when `entity` does not occur at all.
pub fn guess_other_id_field(join_name: &str, entity: &str) -> Option<String> {
    if entity.is_empty() || !join_name.contains(entity) {
        return None;
    }
    let stripped = join_name.replacen(entity, "", 1);
    Some(format!("{}_id", stripped.trim_matches('_')))
}
