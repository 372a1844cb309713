//! Record schema: the six record kinds held in a chain directory.
//!
//! Every kind is a plain serde struct whose field order is the canonical
//! on-disk field order. Unknown fields are rejected at decode time so a
//! canonical rewrite never drops data. Optional fields are omitted when empty.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Asset `type` marking the authoritative (non-bridged) representation.
pub const NATIVE_ASSET_TYPE: &str = "native";

/// Longest symbol an asset may carry, in characters.
pub const MAX_SYMBOL_CHARS: usize = 20;

/// The closed set of record kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Account,
    Asset,
    Binary,
    Contract,
    Entity,
    Pool,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Account,
        RecordKind::Asset,
        RecordKind::Binary,
        RecordKind::Contract,
        RecordKind::Entity,
        RecordKind::Pool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Asset => "asset",
            Self::Binary => "binary",
            Self::Contract => "contract",
            Self::Entity => "entity",
            Self::Pool => "pool",
        }
    }

    /// Canonical file name, e.g. `asset.json`.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Account => "account.json",
            Self::Asset => "asset.json",
            Self::Binary => "binary.json",
            Self::Contract => "contract.json",
            Self::Entity => "entity.json",
            Self::Pool => "pool.json",
        }
    }

    /// Field holding the identity key.
    pub fn identity_field(self) -> &'static str {
        match self {
            Self::Entity => "name",
            _ => "id",
        }
    }

    /// Parse a kind from an exact file base name.
    ///
    /// Only the six canonical names match; `contract-chain.json` or
    /// `my_asset.json` do not.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_name() == name)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownRecordKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind `{0}` (expected one of: account, asset, binary, contract, entity, pool)")]
pub struct UnknownRecordKind(pub String);

/// Behaviour shared by every record kind.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync {
    const KIND: RecordKind;

    /// Identity key, unique within one (chain, kind) file.
    fn identity_key(&self) -> &str;

    /// Name of the entity this record points at, if it points at one.
    fn entity_ref(&self) -> Option<&str> {
        None
    }

    /// First required field that is empty or malformed.
    fn missing_field(&self) -> Option<&'static str>;

    /// Minimum viable record for this kind.
    fn is_minimally_populated(&self) -> bool {
        self.missing_field().is_none()
    }
}

fn decimal_integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("decimal integer regex must compile"))
}

pub(crate) fn is_decimal_integer(value: &str) -> bool {
    decimal_integer_re().is_match(value)
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

// ── Entity ──

/// A named real-world actor (issuer, project) other records may reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub telegram: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub twitter: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discord: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub coinmarketcap: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub coingecko: String,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Record for Entity {
    const KIND: RecordKind = RecordKind::Entity;

    fn identity_key(&self) -> &str {
        &self.name
    }

    fn missing_field(&self) -> Option<&'static str> {
        self.name.is_empty().then_some("name")
    }
}

// ── Asset ──

/// Why an asset's display naming is unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingDefect {
    NameIsId,
    SymbolIsId,
    SymbolTooLong { chars: usize },
}

/// A fungible asset on one chain.
///
/// Bridged assets carry `origin_chain`/`origin_id` pointing at the native
/// asset they represent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entity: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub decimals: String,
    #[serde(rename = "type", default)]
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub circ_supply: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub circ_supply_api: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub total_supply: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub total_supply_api: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub verification_tx: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin_chain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub origin_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub telegram: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub twitter: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub discord: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub coinmarketcap: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub coingecko: String,
}

impl Asset {
    pub fn is_native(&self) -> bool {
        self.asset_type == NATIVE_ASSET_TYPE
    }

    /// A non-native asset that declares where it was bridged from.
    pub fn is_bridged(&self) -> bool {
        !self.is_native() && !self.origin_id.is_empty()
    }

    pub fn naming_defect(&self) -> Option<NamingDefect> {
        if self.name == self.id {
            return Some(NamingDefect::NameIsId);
        }
        if self.symbol == self.id {
            return Some(NamingDefect::SymbolIsId);
        }
        let chars = self.symbol.chars().count();
        if chars > MAX_SYMBOL_CHARS {
            return Some(NamingDefect::SymbolTooLong { chars });
        }
        None
    }
}

impl Record for Asset {
    const KIND: RecordKind = RecordKind::Asset;

    fn identity_key(&self) -> &str {
        &self.id
    }

    fn entity_ref(&self) -> Option<&str> {
        non_empty(&self.entity)
    }

    fn missing_field(&self) -> Option<&'static str> {
        if self.id.is_empty() {
            Some("id")
        } else if self.name.is_empty() {
            Some("name")
        } else if self.symbol.is_empty() {
            Some("symbol")
        } else if !is_decimal_integer(&self.decimals) {
            Some("decimals")
        } else if self.asset_type.is_empty() {
            Some("type")
        } else {
            None
        }
    }

    fn is_minimally_populated(&self) -> bool {
        self.missing_field().is_none() && self.naming_defect().is_none()
    }
}

// ── Account / Binary / Contract ──

/// A labelled on-chain account owned by an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

/// An uploaded contract binary, keyed by its numeric code id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

/// An instantiated contract owned by an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contract {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

macro_rules! labelled_record {
    ($ty:ty, $kind:expr) => {
        impl $ty {
            pub fn new(
                id: impl Into<String>,
                entity: impl Into<String>,
                label: impl Into<String>,
            ) -> Self {
                Self {
                    id: id.into(),
                    entity: entity.into(),
                    label: label.into(),
                }
            }
        }

        impl Record for $ty {
            const KIND: RecordKind = $kind;

            fn identity_key(&self) -> &str {
                &self.id
            }

            fn entity_ref(&self) -> Option<&str> {
                non_empty(&self.entity)
            }

            fn missing_field(&self) -> Option<&'static str> {
                if self.id.is_empty() {
                    Some("id")
                } else if $kind == RecordKind::Binary && !is_decimal_integer(&self.id) {
                    Some("id")
                } else if self.entity.is_empty() {
                    Some("entity")
                } else {
                    None
                }
            }
        }
    };
}

labelled_record!(Account, RecordKind::Account);
labelled_record!(Binary, RecordKind::Binary);
labelled_record!(Contract, RecordKind::Contract);

// ── Pool ──

/// A liquidity pool pairing two assets on a dex.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pool {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub lp_token_id: String,
    #[serde(default)]
    pub asset_ids: Vec<String>,
    #[serde(default)]
    pub dex: String,
    #[serde(rename = "type", default)]
    pub pool_type: String,
}

impl Record for Pool {
    const KIND: RecordKind = RecordKind::Pool;

    fn identity_key(&self) -> &str {
        &self.id
    }

    fn missing_field(&self) -> Option<&'static str> {
        if self.id.is_empty() {
            Some("id")
        } else if self.lp_token_id.is_empty() {
            Some("lp_token_id")
        } else if self.asset_ids.len() != 2 || self.asset_ids.iter().any(String::is_empty) {
            Some("asset_ids")
        } else if self.dex.is_empty() {
            Some("dex")
        } else if self.pool_type.is_empty() {
            Some("type")
        } else {
            None
        }
    }
}
