use std::cmp::Ordering;

use bib3gpp_model::{BibliographicRecord, Entity, Relation};

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Which input record was chosen as main during temporal-precedence
/// resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Candidate,
    Existing,
}

/// Merge a newly parsed record with a previously persisted one sharing the
/// same output key.
///
/// Both records are mutated in place: link backfill, relation
/// transplantation, and contributor addition all happen on the inputs, and
/// the record that loses the main role has its relation list zeroed as a
/// side effect of the transplant. Returns the chosen main record when
/// anything changed, `None` when there is nothing to re-persist.
pub fn merge<'a>(
    candidate: &'a mut BibliographicRecord,
    existing: &'a mut BibliographicRecord,
) -> Option<&'a mut BibliographicRecord> {
    let mut changed = update_links(candidate, existing);

    let (role, relation_added) = resolve_temporal_relation(candidate, existing);
    changed |= relation_added;

    let (main, subordinate) = match role {
        Role::Candidate => (candidate, existing),
        Role::Existing => (existing, candidate),
    };
    changed |= add_contributors(main, subordinate);

    if changed {
        Some(main)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Step 1: link reconciliation
// ---------------------------------------------------------------------------

/// Backfill links when exactly one record has none.
///
/// Both-empty and both-non-empty are no-ops; differing non-empty link sets
/// are never reconciled (no union, no conflict report).
pub fn update_links(a: &mut BibliographicRecord, b: &mut BibliographicRecord) -> bool {
    if !a.links.is_empty() && b.links.is_empty() {
        b.links = a.links.clone();
        true
    } else if a.links.is_empty() && !b.links.is_empty() {
        a.links = b.links.clone();
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// Step 2: temporal precedence
// ---------------------------------------------------------------------------

/// Assign main/subordinate roles from the records' first dates and attach a
/// transposed relation where lineage can be inferred.
///
/// Only `dates[0]` is consulted; the parser guarantees the most relevant
/// date comes first. Returns the chosen role and whether a relation was
/// attached.
pub fn resolve_temporal_relation(
    candidate: &mut BibliographicRecord,
    existing: &mut BibliographicRecord,
) -> (Role, bool) {
    if existing.dates.is_empty() {
        // Neither record dated, or only the candidate dated: the candidate
        // keeps the main role but no lineage can be inferred.
        return (Role::Candidate, false);
    }
    if candidate.dates.is_empty() {
        attach_transposed_relation(existing, candidate);
        return (Role::Existing, true);
    }
    match candidate.dates[0].on.cmp(&existing.dates[0].on) {
        Ordering::Less => {
            attach_transposed_relation(candidate, existing);
            (Role::Candidate, true)
        }
        Ordering::Greater => {
            attach_transposed_relation(existing, candidate);
            (Role::Existing, true)
        }
        Ordering::Equal => (Role::Candidate, false),
    }
}

/// Move every relation from `subordinate` onto `main`, then record a single
/// `adoptedAs` relation on `main` pointing at the now relation-free
/// subordinate.
fn attach_transposed_relation(
    main: &mut BibliographicRecord,
    subordinate: &mut BibliographicRecord,
) {
    let mut moved = std::mem::take(&mut subordinate.relations);
    main.relations.append(&mut moved);
    main.relations.push(Relation {
        kind: Relation::ADOPTED_AS.to_string(),
        record: Box::new(subordinate.clone()),
        description: Some("equivalent".to_string()),
    });
}

// ---------------------------------------------------------------------------
// Step 3: contributors
// ---------------------------------------------------------------------------

/// Fold the subordinate's person contributors into the main record.
///
/// Persons are matched by entity name; a match contributes only the
/// affiliations not already present (by value equality), a miss appends the
/// whole contributor. Organization contributors are publisher boilerplate
/// already present on both sides and are never merged.
pub fn add_contributors(
    main: &mut BibliographicRecord,
    subordinate: &BibliographicRecord,
) -> bool {
    let mut changed = false;

    for contributor in &subordinate.contributors {
        let person = match contributor.entity.as_person() {
            Some(person) => person,
            None => continue,
        };

        let found = main.contributors.iter_mut().find(
            |existing| matches!(&existing.entity, Entity::Person(p) if p.name == person.name),
        );
        match found {
            Some(existing) => {
                if let Entity::Person(existing_person) = &mut existing.entity {
                    for affiliation in &person.affiliations {
                        if !existing_person.affiliations.contains(affiliation) {
                            existing_person.affiliations.push(affiliation.clone());
                            changed = true;
                        }
                    }
                }
            }
            None => {
                main.contributors.push(contributor.clone());
                changed = true;
            }
        }
    }

    changed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
