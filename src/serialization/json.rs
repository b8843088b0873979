//! JSON serializer.
//!
//! Responses are read with `serde_json`'s streaming deserializer and
//! hand-written visitors, so top-level keys are matched by name in whatever
//! order the server sends them and no intermediate `Value` tree is built.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Entity, RedmineSerializer};
use crate::paged::backfill_total;
use crate::{Error, PagedResult, Result};

pub(crate) const FORMAT: &str = "json";

/// The JSON implementation of [`RedmineSerializer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl RedmineSerializer for JsonSerializer {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn serialize<T: Entity>(&self, entity: &T) -> Result<String> {
        serde_json::to_string(&Rooted {
            key: T::ROOT,
            value: entity,
        })
        .map_err(|e| Error::serialization(FORMAT, e))
    }

    /// An empty payload, or one without the root key, yields `T::default()`.
    fn deserialize<T: Entity>(&self, payload: &str) -> Result<T> {
        if payload.trim().is_empty() {
            return Ok(T::default());
        }

        let single: Single<T> =
            serde_json::from_str(payload).map_err(|e| Error::deserialization(FORMAT, e))?;
        Ok(single.0.unwrap_or_default())
    }

    fn deserialize_paged<T: Entity>(&self, payload: &str) -> Result<PagedResult<T>> {
        if payload.trim().is_empty() {
            return Ok(PagedResult::default());
        }

        let page: Page<T> =
            serde_json::from_str(payload).map_err(|e| Error::deserialization(FORMAT, e))?;
        Ok(page.0)
    }

    /// Stops reading as soon as a non-zero `total_count` has been seen.
    ///
    /// Without one, the item array is walked with `IgnoredAny` to apply the
    /// same backfill rule as [`deserialize_paged`](Self::deserialize_paged).
    fn count<T: Entity>(&self, payload: &str) -> Result<u64> {
        if payload.trim().is_empty() {
            return Ok(0);
        }

        let found = Cell::new(None);
        let mut deserializer = serde_json::Deserializer::from_str(payload);
        let scanned = Deserializer::deserialize_map(
            &mut deserializer,
            CountVisitor::<T> {
                found: &found,
                marker: PhantomData,
            },
        );

        // An early return leaves the rest of the object unread, which
        // serde_json reports as an error; the count is already known.
        if let Some(total) = found.get() {
            return Ok(total);
        }

        let total = scanned.map_err(|e| Error::deserialization(FORMAT, e))?;
        deserializer
            .end()
            .map_err(|e| Error::deserialization(FORMAT, e))?;
        Ok(total)
    }
}

/// `{"<key>": value}`
struct Rooted<'a, T> {
    key: &'static str,
    value: &'a T,
}

impl<T: Serialize> Serialize for Rooted<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, self.value)?;
        map.end()
    }
}

struct Single<T>(Option<T>);

impl<'de, T: Entity> Deserialize<'de> for Single<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SingleVisitor<T>(PhantomData<T>);

        impl<'de, T: Entity> Visitor<'de> for SingleVisitor<T> {
            type Value = Single<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an object with a `{}` key", T::ROOT)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut value = None;
                while let Some(key) = map.next_key::<String>()? {
                    if key == T::ROOT {
                        value = Some(map.next_value::<T>()?);
                    } else {
                        map.next_value::<IgnoredAny>()?;
                    }
                }
                Ok(Single(value))
            }
        }

        deserializer.deserialize_map(SingleVisitor(PhantomData))
    }
}

struct Page<T>(PagedResult<T>);

impl<'de, T: Entity> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PageVisitor<T>(PhantomData<T>);

        impl<'de, T: Entity> Visitor<'de> for PageVisitor<T> {
            type Value = Page<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "an object with a `{}` array", T::COLLECTION)
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut items = Vec::new();
                let mut total_count = 0;
                let mut offset = 0;
                let mut limit = 0;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "total_count" => total_count = map.next_value::<Option<u64>>()?.unwrap_or(0),
                        "offset" => offset = map.next_value::<Option<u64>>()?.unwrap_or(0),
                        "limit" => limit = map.next_value::<Option<u64>>()?.unwrap_or(0),
                        k if k == T::COLLECTION => {
                            items = map.next_value::<Option<Vec<T>>>()?.unwrap_or_default();
                        }
                        _ => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }

                Ok(Page(PagedResult::new(items, total_count, offset, limit)))
            }
        }

        deserializer.deserialize_map(PageVisitor(PhantomData))
    }
}

struct CountVisitor<'c, T> {
    found: &'c Cell<Option<u64>>,
    marker: PhantomData<T>,
}

impl<'de, T: Entity> Visitor<'de> for CountVisitor<'_, T> {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an object with a `{}` array", T::COLLECTION)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut parsed = 0;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "total_count" => {
                    let total = map.next_value::<Option<u64>>()?.unwrap_or(0);
                    if total > 0 {
                        self.found.set(Some(total));
                        return Ok(total);
                    }
                }
                k if k == T::COLLECTION => parsed = map.next_value::<ItemCount>()?.0,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(backfill_total(0, parsed))
    }
}

/// Number of elements in a JSON array, read without building them.
struct ItemCount(usize);

impl<'de> Deserialize<'de> for ItemCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ItemCountVisitor;

        impl<'de> Visitor<'de> for ItemCountVisitor {
            type Value = ItemCount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an array or null")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
                Ok(ItemCount(0))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error> {
                let mut count = 0;
                while seq.next_element::<IgnoredAny>()?.is_some() {
                    count += 1;
                }
                Ok(ItemCount(count))
            }
        }

        deserializer.deserialize_any(ItemCountVisitor)
    }
}
