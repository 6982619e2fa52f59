// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keys derived from plain structs.
//!
//! A struct with accessor methods (`title()`) and optional mutators
//! (`set_title(..)`) can describe itself through [`Bean`] instead of
//! declaring [`Key`](crate::Key)s. [`BeanProperties`] turns the accessor list
//! into the same [`KeyDescriptor`]s a hand-written key set would produce.
//!
//! The [`bean_accessors!`](crate::bean_accessors) macro builds the accessor
//! list. Properties listed as `readonly` have no mutator and become keys that
//! do not allow updates.

use core::fmt;

use crate::error::{BeanError, ConversionError, RegistryError};
use crate::item::JsonItem;
use crate::key::KeyDescriptor;
use crate::registry::KeyRegistry;
use crate::value::{PropertyValue, SequenceKind, Value, ValueKind};

type Getter<B> = Box<dyn Fn(&B) -> Value + Send + Sync>;
type Setter<B> = Box<dyn Fn(&mut B, &Value) -> Result<(), ConversionError> + Send + Sync>;

/// One harvested property of a bean type `B`.
pub struct BeanAccessor<B> {
    name: &'static str,
    kind: ValueKind,
    sequence: Option<SequenceKind>,
    getter: Getter<B>,
    setter: Option<Setter<B>>,
}

impl<B: 'static> BeanAccessor<B> {
    /// Creates a property with an accessor only.
    #[must_use]
    pub fn read_only<T: PropertyValue + 'static>(name: &'static str, get: fn(&B) -> T) -> Self {
        Self {
            name,
            kind: T::KIND,
            sequence: T::SEQUENCE,
            getter: Box::new(move |bean: &B| get(bean).into_value()),
            setter: None,
        }
    }

    /// Creates a property with an accessor and a mutator.
    #[must_use]
    pub fn read_write<T: PropertyValue + 'static>(
        name: &'static str,
        get: fn(&B) -> T,
        set: fn(&mut B, T),
    ) -> Self {
        Self {
            setter: Some(Box::new(
                move |bean: &mut B, value: &Value| -> Result<(), ConversionError> {
                    set(bean, T::from_value(value)?);
                    Ok(())
                },
            )),
            ..Self::read_only(name, get)
        }
    }
}

impl<B> BeanAccessor<B> {
    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the property has a mutator.
    #[must_use]
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Returns the key this property corresponds to.
    #[must_use]
    pub fn descriptor(&self) -> KeyDescriptor {
        let descriptor =
            KeyDescriptor::unchecked(self.name, self.kind).with_update_allowed(self.is_writable());
        match self.sequence {
            Some(sequence) => descriptor.with_sequence(sequence),
            None => descriptor,
        }
    }
}

impl<B> fmt::Debug for BeanAccessor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanAccessor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("writable", &self.is_writable())
            .finish_non_exhaustive()
    }
}

/// A plain struct that lists its own properties.
///
/// # Example
///
/// ```rust
/// use understory_json_item::{Bean, BeanAccessor, BeanProperties, Value, bean_accessors};
///
/// #[derive(Default)]
/// struct Room {
///     id: String,
///     seats: i64,
/// }
///
/// impl Room {
///     fn id(&self) -> &str {
///         &self.id
///     }
///
///     fn seats(&self) -> i64 {
///         self.seats
///     }
///
///     fn set_seats(&mut self, seats: i64) {
///         self.seats = seats;
///     }
/// }
///
/// impl Bean for Room {
///     fn accessors() -> Vec<BeanAccessor<Self>> {
///         bean_accessors!(Room { readonly id: String, seats: i64 })
///     }
/// }
///
/// let properties = BeanProperties::<Room>::harvest();
/// let mut room = Room::default();
/// properties.set(&mut room, "seats", &Value::Int(8)).unwrap();
/// assert_eq!(room.seats, 8);
/// assert!(properties.set(&mut room, "id", &Value::from("r2")).is_err());
/// ```
pub trait Bean: Sized + 'static {
    /// Returns the accessors of this type in declaration order.
    fn accessors() -> Vec<BeanAccessor<Self>>;
}

/// The harvested properties of a bean type.
pub struct BeanProperties<B> {
    accessors: Vec<BeanAccessor<B>>,
}

impl<B: Bean> BeanProperties<B> {
    /// Collects the properties of `B`.
    #[must_use]
    pub fn harvest() -> Self {
        Self {
            accessors: B::accessors(),
        }
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    /// Returns `true` if `B` has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    /// Returns one key per property, in declaration order.
    ///
    /// Properties without a mutator become keys that do not allow updates.
    /// Names are validated when a registry is built from these keys.
    #[must_use]
    pub fn keys(&self) -> Vec<KeyDescriptor> {
        self.accessors.iter().map(BeanAccessor::descriptor).collect()
    }

    /// Builds a registry from the harvested keys.
    ///
    /// # Errors
    ///
    /// Fails like [`KeyRegistryBuilder::build`](crate::KeyRegistryBuilder::build).
    pub fn registry(
        &self,
        type_name: &'static str,
        id_key: &'static str,
    ) -> Result<KeyRegistry, RegistryError> {
        KeyRegistry::builder(type_name, id_key)
            .descriptors(self.keys())
            .build()
    }

    fn accessor(&self, name: &str) -> Result<&BeanAccessor<B>, BeanError> {
        self.accessors
            .iter()
            .find(|accessor| accessor.name == name)
            .ok_or_else(|| BeanError::UnknownProperty(name.to_owned()))
    }

    /// Reads a property.
    ///
    /// # Errors
    ///
    /// Returns [`BeanError::UnknownProperty`] if `B` has no such property.
    pub fn get(&self, bean: &B, name: &str) -> Result<Value, BeanError> {
        Ok((self.accessor(name)?.getter)(bean))
    }

    /// Writes a property through its mutator.
    ///
    /// # Errors
    ///
    /// - [`BeanError::UnknownProperty`] if `B` has no such property.
    /// - [`BeanError::NotSupported`] if the property has no mutator.
    /// - [`BeanError::Conversion`] if `value` does not fit the property type.
    pub fn set(&self, bean: &mut B, name: &str, value: &Value) -> Result<(), BeanError> {
        let accessor = self.accessor(name)?;
        let setter = accessor
            .setter
            .as_ref()
            .ok_or(BeanError::NotSupported(accessor.name))?;
        setter(bean, value).map_err(|source| BeanError::Conversion {
            property: accessor.name,
            source,
        })
    }

    /// Creates an item holding every property of `bean`.
    ///
    /// Properties the registry does not know are ignored. The item is not
    /// known to the peer and has no dirty keys.
    ///
    /// # Errors
    ///
    /// Returns [`BeanError::UnknownProperty`] if `B` has no property for the
    /// registry's identity key.
    pub fn to_item(&self, bean: &B, registry: &'static KeyRegistry) -> Result<JsonItem, BeanError> {
        let id = self.get(bean, registry.id_key().name())?;
        let mut item = JsonItem::new(registry, id);
        for accessor in &self.accessors {
            if registry.contains(accessor.name) {
                item.set_value_without_dirty_change(accessor.name, (accessor.getter)(bean));
            }
        }
        Ok(item)
    }

    /// Writes every value stored in `item` back into `bean`.
    ///
    /// Only writable properties are touched; defaults are not written.
    ///
    /// # Errors
    ///
    /// Returns [`BeanError::Conversion`] for the first value that does not fit
    /// its property.
    pub fn apply_item(&self, item: &JsonItem, bean: &mut B) -> Result<(), BeanError> {
        let registry = item.registry();
        for accessor in self.accessors.iter().filter(|a| a.is_writable()) {
            if registry.contains(accessor.name)
                && item.has_value(accessor.name)
                && let Some(value) = item.get_ref(accessor.name)
            {
                self.set(bean, accessor.name, value)?;
            }
        }
        Ok(())
    }
}

impl<B> fmt::Debug for BeanProperties<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanProperties")
            .field("type", &core::any::type_name::<B>())
            .field("accessors", &self.accessors)
            .finish()
    }
}

/// Lists the accessors of a bean type.
///
/// Each entry names a property and its value type. The accessor is a method
/// of the same name returning something convertible into the type; the
/// mutator is `set_<name>`. Entries marked `readonly` have no mutator, and
/// `as "wireName"` overrides the property name.
///
/// The accessors are collected into the collection the context asks for,
/// usually `Vec<BeanAccessor<_>>`.
///
/// ```rust
/// # use understory_json_item::{BeanAccessor, bean_accessors};
/// struct Slot {
///     start: String,
///     booked: bool,
/// }
///
/// impl Slot {
///     fn start(&self) -> &str {
///         &self.start
///     }
///
///     fn booked(&self) -> bool {
///         self.booked
///     }
///
///     fn set_booked(&mut self, booked: bool) {
///         self.booked = booked;
///     }
/// }
///
/// let accessors: Vec<BeanAccessor<Slot>> = bean_accessors!(Slot {
///     readonly start as "startTime": String,
///     booked: bool,
/// });
/// assert_eq!(accessors[0].name(), "startTime");
/// assert!(!accessors[0].is_writable());
/// assert!(accessors[1].is_writable());
/// ```
#[macro_export]
macro_rules! bean_accessors {
    (@munch [$($done:expr),*] $bean:ty; ) => {
        [$($done),*].into_iter().collect()
    };

    (@munch [$($done:expr),*] $bean:ty;
        readonly $field:ident $(as $name:literal)? : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::bean_accessors!(@munch [
            $($done,)*
            $crate::BeanAccessor::<$bean>::read_only::<$ty>(
                $crate::bean_accessors!(@name $field $(, $name)?),
                |bean: &$bean| -> $ty { ::core::convert::Into::into(bean.$field()) },
            )
        ] $bean; $($($rest)*)?)
    };

    (@munch [$($done:expr),*] $bean:ty;
        $field:ident $(as $name:literal)? : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::bean_accessors!(@munch [
            $($done,)*
            $crate::__private::paste! {
                $crate::BeanAccessor::<$bean>::read_write::<$ty>(
                    $crate::bean_accessors!(@name $field $(, $name)?),
                    |bean: &$bean| -> $ty { ::core::convert::Into::into(bean.$field()) },
                    |bean: &mut $bean, value: $ty| {
                        bean.[<set_ $field>](value);
                    },
                )
            }
        ] $bean; $($($rest)*)?)
    };

    (@name $field:ident) => {
        ::core::stringify!($field)
    };

    (@name $field:ident, $name:literal) => {
        $name
    };

    ($bean:ty { $($body:tt)* }) => {
        $crate::bean_accessors!(@munch [] $bean; $($body)*)
    };
}
