use log::info;
use regex::Regex;

use crate::model::Group;

/// Selects which parts of a description document are kept in the model
#[derive(Default)]
pub struct Filters {
    /// Filter peripherals by name
    pub(crate) group: Option<ItemFilter<String>>,
    /// Filter registers by name, within every peripheral
    pub(crate) register: Option<ItemFilter<String>>,
}

impl Filters {
    /// Take everything in input
    pub fn all() -> Self {
        Self {
            group: None,
            register: None,
        }
    }

    pub fn from_filters(
        group_filter: Option<ItemFilter<String>>,
        register_filter: Option<ItemFilter<String>>,
    ) -> Self {
        Self {
            group: group_filter,
            register: register_filter,
        }
    }

    /// Drop the peripherals and registers blocked by these filters
    ///
    /// Runs after parsing so that `derivedFrom` may refer to peripherals that end up filtered out.
    pub(crate) fn apply(&self, groups: Vec<Group>) -> Vec<Group> {
        groups
            .into_iter()
            .filter(|g| {
                let blocked = self
                    .group
                    .as_ref()
                    .is_some_and(|f| f.is_blocked(g.name.as_str()));
                if blocked {
                    info!("peripheral {} was not included due to peripheral filters", g.name);
                }
                !blocked
            })
            .map(|mut g| {
                if let Some(f) = &self.register {
                    g.registers.retain(|r| f.is_allowed(r.name.as_str()));
                }
                g
            })
            .collect()
    }
}

/// What items of type `T` are allowed or not
pub enum ItemFilter<T: PartialEq> {
    List {
        // If set, only the specified items are allowed. If not set, all items are
        // allowed except the ones listed in blocklist.
        allow_list: Option<Vec<T>>,
        // These items are always blocked even if present in `allow_list`
        block_list: Vec<T>,
    },
    Regex {
        // If set, only items matching the regex are allowed
        allow: Option<Regex>,
        // If set, items matching the regex are not allowed
        block: Option<Regex>,
    },
}

pub(crate) trait IsAllowedOrBlocked<V> {
    fn is_allowed(&self, value: V) -> bool;
    fn is_blocked(&self, value: V) -> bool;
}

impl<T, V> IsAllowedOrBlocked<V> for ItemFilter<T>
where
    T: PartialEq + From<V>,
    V: Into<T> + ToString + Clone,
{
    fn is_allowed(&self, value: V) -> bool {
        match self {
            Self::List {
                allow_list,
                block_list,
            } => {
                // Items in block list are always blocked
                if block_list.contains(&value.clone().into()) {
                    return false;
                }
                allow_list
                    .as_ref()
                    .map_or(true, |wl| wl.contains(&value.into()))
            }
            Self::Regex { allow, block } => {
                let value = value.to_string();
                // Items matched by block regex are always blocked
                if block.as_ref().is_some_and(|block| block.is_match(&value)) {
                    return false;
                }
                allow.as_ref().map_or(true, |allow| allow.is_match(&value))
            }
        }
    }

    fn is_blocked(&self, value: V) -> bool {
        !self.is_allowed(value)
    }
}

impl<T: PartialEq> ItemFilter<T> {
    pub fn list(allow_list: Option<Vec<T>>, block_list: Vec<T>) -> ItemFilter<T> {
        Self::List {
            allow_list,
            block_list,
        }
    }

    pub const fn regex(allow: Option<Regex>, block: Option<Regex>) -> ItemFilter<T> {
        Self::Regex { allow, block }
    }
}
