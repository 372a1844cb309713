//! Enforced order: the canonical, deterministic on-disk order per kind.
//!
//! Text keys compare case-insensitively first and fall back to byte order,
//! which makes every comparator a total order over distinct keys. Sorting is
//! stable, so records with identical keys keep their relative order.

use crate::record::{Account, Asset, Binary, Contract, Entity, Pool};
use std::cmp::Ordering;

/// A record kind with a fixed canonical sort key.
pub trait EnforcedOrder {
    fn enforced_cmp(&self, other: &Self) -> Ordering;
}

/// Stable sort into enforced order.
pub fn sort_records<T: EnforcedOrder>(records: &mut [T]) {
    records.sort_by(EnforcedOrder::enforced_cmp);
}

/// Whether `records` is already in enforced order.
pub fn is_sorted<T: EnforcedOrder>(records: &[T]) -> bool {
    records
        .windows(2)
        .all(|pair| pair[0].enforced_cmp(&pair[1]) != Ordering::Greater)
}

fn text_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Numeric when both sides are integers, so code id `9` sorts before `10`.
fn numeric_text_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => text_cmp(a, b),
    }
}

macro_rules! labelled_order {
    ($ty:ty) => {
        impl EnforcedOrder for $ty {
            fn enforced_cmp(&self, other: &Self) -> Ordering {
                text_cmp(&self.entity, &other.entity)
                    .then_with(|| text_cmp(&self.label, &other.label))
                    .then_with(|| text_cmp(&self.id, &other.id))
            }
        }
    };
}

labelled_order!(Account);
labelled_order!(Contract);

impl EnforcedOrder for Binary {
    fn enforced_cmp(&self, other: &Self) -> Ordering {
        numeric_text_cmp(&self.id, &other.id)
    }
}

impl EnforcedOrder for Asset {
    // Assets with an entity come first, grouped by entity.
    fn enforced_cmp(&self, other: &Self) -> Ordering {
        match (self.entity.is_empty(), other.entity.is_empty()) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            _ => text_cmp(&self.entity, &other.entity)
                .then_with(|| text_cmp(&self.name, &other.name))
                .then_with(|| text_cmp(&self.id, &other.id)),
        }
    }
}

impl EnforcedOrder for Entity {
    fn enforced_cmp(&self, other: &Self) -> Ordering {
        text_cmp(&self.name, &other.name)
    }
}

impl EnforcedOrder for Pool {
    fn enforced_cmp(&self, other: &Self) -> Ordering {
        text_cmp(&self.dex, &other.dex)
            .then_with(|| text_cmp(&self.pool_type, &other.pool_type))
            .then_with(|| text_cmp(&self.id, &other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(id: &str, entity: &str, name: &str) -> Asset {
        Asset {
            id: id.to_string(),
            entity: entity.to_string(),
            name: name.to_string(),
            ..Asset::default()
        }
    }

    fn ids<T, F: Fn(&T) -> &str>(records: &[T], key: F) -> Vec<&str> {
        records.iter().map(key).collect()
    }

    #[test]
    fn assets_with_entities_come_first() {
        let mut assets = vec![
            asset("uosmo", "", "Osmosis"),
            asset("ujuno", "Juno", "Juno"),
            asset("uatom", "", "Cosmos"),
            asset("uluna", "Acme", "Luna"),
        ];
        sort_records(&mut assets);
        assert_eq!(
            ids(&assets, |a| a.id.as_str()),
            vec!["uluna", "ujuno", "uatom", "uosmo"]
        );
    }

    #[test]
    fn text_keys_ignore_case_before_bytes() {
        let mut entities = vec![
            Entity::new("beta"),
            Entity::new("Alpha"),
            Entity::new("alpha"),
            Entity::new("Beta"),
        ];
        sort_records(&mut entities);
        assert_eq!(
            ids(&entities, |e| e.name.as_str()),
            vec!["Alpha", "alpha", "Beta", "beta"]
        );
    }

    #[test]
    fn binaries_sort_by_numeric_code_id() {
        let mut binaries = vec![
            Binary::new("10", "Acme", ""),
            Binary::new("9", "Acme", ""),
            Binary::new("100", "Acme", ""),
        ];
        sort_records(&mut binaries);
        assert_eq!(ids(&binaries, |b| b.id.as_str()), vec!["9", "10", "100"]);
    }

    #[test]
    fn labelled_records_sort_by_entity_label_id() {
        let mut accounts = vec![
            Account::new("c", "Beta", "treasury"),
            Account::new("b", "Alpha", "vault"),
            Account::new("a", "Alpha", "vault"),
            Account::new("d", "Alpha", "dao"),
        ];
        sort_records(&mut accounts);
        assert_eq!(ids(&accounts, |a| a.id.as_str()), vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn pools_sort_by_dex_type_id() {
        let pool = |id: &str, dex: &str, pool_type: &str| Pool {
            id: id.to_string(),
            dex: dex.to_string(),
            pool_type: pool_type.to_string(),
            ..Pool::default()
        };
        let mut pools = vec![
            pool("p3", "osmosis", "xyk"),
            pool("p2", "astroport", "stable"),
            pool("p1", "osmosis", "stable"),
        ];
        sort_records(&mut pools);
        assert_eq!(ids(&pools, |p| p.id.as_str()), vec!["p2", "p1", "p3"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        // Same sort key, distinguished only by a field outside the key tuple.
        let mut first_entity = Entity::new("Acme");
        first_entity.website = "https://one.example".to_string();
        let mut second_entity = Entity::new("Acme");
        second_entity.website = "https://two.example".to_string();

        let mut entities = vec![
            Entity::new("Zeta"),
            first_entity.clone(),
            second_entity.clone(),
        ];
        sort_records(&mut entities);
        assert_eq!(entities[0], first_entity);
        assert_eq!(entities[1], second_entity);

        let mut reversed = vec![second_entity.clone(), Entity::new("Zeta"), first_entity.clone()];
        sort_records(&mut reversed);
        assert_eq!(reversed[0], second_entity);
        assert_eq!(reversed[1], first_entity);
    }

    #[test]
    fn sort_is_idempotent() {
        let mut assets = vec![
            asset("b", "", "Beta"),
            asset("a", "Acme", "Alpha"),
            asset("c", "acme", "alpha"),
            asset("d", "", "beta"),
        ];
        sort_records(&mut assets);
        assert!(is_sorted(&assets));
        let once = assets.clone();
        sort_records(&mut assets);
        assert_eq!(assets, once);
    }
}
