//! Sandbox realm heap.
//!
//! A small object arena with the ordinary-object semantics property
//! assertions rely on: prototype chains, full property descriptors,
//! extensibility and array `length`. Each in-process realm owns its own
//! `Heap`, so anything a case does to `Array.prototype` dies with the realm.

use crate::assert::ObjectAccess;
use core_types::{ErrorKind, JsError, ObjectId, PropertyDescriptor, PropertyKey, SymbolId, Value};

/// What kind of object a heap slot holds
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectClass {
    /// Plain object
    Ordinary,
    /// Array exotic object
    Array,
    /// Callable; the heap never calls it
    Function {
        /// Function name
        name: String,
        /// Declared parameter count
        length: u32,
    },
    /// Error instance
    Error(ErrorKind),
}

/// One object in the arena
#[derive(Debug, Clone)]
pub struct ObjectData {
    /// Object class
    pub class: ObjectClass,
    /// [[Prototype]]
    pub prototype: Option<ObjectId>,
    /// [[Extensible]]
    pub extensible: bool,
    properties: Vec<(PropertyKey, PropertyDescriptor)>,
}

impl ObjectData {
    fn new(class: ObjectClass, prototype: Option<ObjectId>) -> Self {
        Self {
            class,
            prototype,
            extensible: true,
            properties: Vec::new(),
        }
    }

    fn find(&self, key: &PropertyKey) -> Option<usize> {
        self.properties.iter().position(|(k, _)| k == key)
    }

    fn own(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.find(key).map(|i| &self.properties[i].1)
    }
}

/// Well-known objects of a fresh realm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intrinsics {
    /// The global object
    pub global: ObjectId,
    /// %Object.prototype%
    pub object_prototype: ObjectId,
    /// %Function.prototype%
    pub function_prototype: ObjectId,
    /// %Array.prototype%
    pub array_prototype: ObjectId,
    /// %String.prototype%
    pub string_prototype: ObjectId,
    /// %Error.prototype%
    pub error_prototype: ObjectId,
    /// %Object%
    pub object_constructor: ObjectId,
    /// %Array%
    pub array_constructor: ObjectId,
    /// %String%
    pub string_constructor: ObjectId,
    /// %Error%
    pub error_constructor: ObjectId,
}

/// Object arena for one realm
#[derive(Debug, Clone)]
pub struct Heap {
    objects: Vec<ObjectData>,
    intrinsics: Intrinsics,
    next_symbol: u32,
}

fn length_key() -> PropertyKey {
    PropertyKey::from("length")
}

fn array_index(key: &PropertyKey) -> Option<u32> {
    let PropertyKey::String(s) = key else {
        return None;
    };
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    s.parse::<u32>().ok().filter(|i| *i != u32::MAX)
}

fn complete(mut descriptor: PropertyDescriptor) -> PropertyDescriptor {
    if descriptor.is_accessor() {
        descriptor.get.get_or_insert(Value::Undefined);
        descriptor.set.get_or_insert(Value::Undefined);
    } else {
        descriptor.value.get_or_insert(Value::Undefined);
        descriptor.writable.get_or_insert(false);
    }
    descriptor.enumerable.get_or_insert(false);
    descriptor.configurable.get_or_insert(false);
    descriptor
}

fn same_optional(a: &Option<Value>, b: &Option<Value>) -> bool {
    let undefined = Value::Undefined;
    a.as_ref()
        .unwrap_or(&undefined)
        .same_value(b.as_ref().unwrap_or(&undefined))
}

impl Heap {
    /// A fresh realm's heap with its intrinsics installed
    pub fn new() -> Self {
        let placeholder = ObjectId(0);
        let mut heap = Self {
            objects: Vec::new(),
            intrinsics: Intrinsics {
                global: placeholder,
                object_prototype: placeholder,
                function_prototype: placeholder,
                array_prototype: placeholder,
                string_prototype: placeholder,
                error_prototype: placeholder,
                object_constructor: placeholder,
                array_constructor: placeholder,
                string_constructor: placeholder,
                error_constructor: placeholder,
            },
            next_symbol: 0,
        };
        heap.install_intrinsics();
        heap
    }

    fn alloc(&mut self, data: ObjectData) -> ObjectId {
        self.objects.push(data);
        ObjectId(self.objects.len() - 1)
    }

    // Writes a property without validation; only for realm setup.
    fn put(&mut self, object: ObjectId, key: &str, descriptor: PropertyDescriptor) {
        let key = PropertyKey::from(key);
        let data = &mut self.objects[object.0];
        match data.find(&key) {
            Some(i) => data.properties[i].1 = descriptor,
            None => data.properties.push((key, descriptor)),
        }
    }

    fn install_intrinsics(&mut self) {
        let object_prototype = self.alloc(ObjectData::new(ObjectClass::Ordinary, None));
        let function_prototype = self.alloc(ObjectData::new(
            ObjectClass::Function {
                name: String::new(),
                length: 0,
            },
            Some(object_prototype),
        ));
        self.intrinsics.object_prototype = object_prototype;
        self.intrinsics.function_prototype = function_prototype;

        let array_prototype =
            self.alloc(ObjectData::new(ObjectClass::Array, Some(object_prototype)));
        self.put(
            array_prototype,
            "length",
            PropertyDescriptor::data(Value::Smi(0), true, false, false),
        );
        let string_prototype =
            self.alloc(ObjectData::new(ObjectClass::Ordinary, Some(object_prototype)));
        let error_prototype =
            self.alloc(ObjectData::new(ObjectClass::Ordinary, Some(object_prototype)));
        self.put(
            error_prototype,
            "name",
            PropertyDescriptor::data(Value::string("Error"), true, false, true),
        );
        self.put(
            error_prototype,
            "message",
            PropertyDescriptor::data(Value::string(""), true, false, true),
        );
        self.intrinsics.array_prototype = array_prototype;
        self.intrinsics.string_prototype = string_prototype;
        self.intrinsics.error_prototype = error_prototype;

        let to_lower_case = self.create_function("toLowerCase", 0);
        self.put(
            string_prototype,
            "toLowerCase",
            PropertyDescriptor::data(Value::Object(to_lower_case), true, false, true),
        );

        let object_constructor = self.constructor("Object", object_prototype);
        let array_constructor = self.constructor("Array", array_prototype);
        let string_constructor = self.constructor("String", string_prototype);
        let error_constructor = self.constructor("Error", error_prototype);
        self.intrinsics.object_constructor = object_constructor;
        self.intrinsics.array_constructor = array_constructor;
        self.intrinsics.string_constructor = string_constructor;
        self.intrinsics.error_constructor = error_constructor;

        let global = self.alloc(ObjectData::new(ObjectClass::Ordinary, Some(object_prototype)));
        self.intrinsics.global = global;
        for (name, ctor) in [
            ("Object", object_constructor),
            ("Array", array_constructor),
            ("String", string_constructor),
            ("Error", error_constructor),
            ("globalThis", global),
        ] {
            self.put(
                global,
                name,
                PropertyDescriptor::data(Value::Object(ctor), true, false, true),
            );
        }
        for (name, value) in [
            ("undefined", Value::Undefined),
            ("NaN", Value::Double(f64::NAN)),
            ("Infinity", Value::Double(f64::INFINITY)),
        ] {
            self.put(global, name, PropertyDescriptor::data(value, false, false, false));
        }
    }

    fn constructor(&mut self, name: &str, prototype: ObjectId) -> ObjectId {
        let ctor = self.create_function(name, 1);
        self.put(
            ctor,
            "prototype",
            PropertyDescriptor::data(Value::Object(prototype), false, false, false),
        );
        self.put(
            prototype,
            "constructor",
            PropertyDescriptor::data(Value::Object(ctor), true, false, true),
        );
        ctor
    }

    /// The realm's well-known objects
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The global object
    pub fn global(&self) -> ObjectId {
        self.intrinsics.global
    }

    fn data(&self, object: ObjectId) -> Result<&ObjectData, JsError> {
        self.objects
            .get(object.0)
            .ok_or_else(|| JsError::type_error(format!("no object #{} in this realm", object.0)))
    }

    fn data_mut(&mut self, object: ObjectId) -> Result<&mut ObjectData, JsError> {
        self.objects
            .get_mut(object.0)
            .ok_or_else(|| JsError::type_error(format!("no object #{} in this realm", object.0)))
    }

    /// New object with the given prototype
    pub fn create_object(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.alloc(ObjectData::new(ObjectClass::Ordinary, prototype))
    }

    /// `{}`
    pub fn create_plain_object(&mut self) -> ObjectId {
        let proto = self.intrinsics.object_prototype;
        self.create_object(Some(proto))
    }

    /// `[a, b, ...]`
    pub fn create_array(&mut self, elements: Vec<Value>) -> ObjectId {
        let proto = self.intrinsics.array_prototype;
        let array = self.alloc(ObjectData::new(ObjectClass::Array, Some(proto)));
        let len = elements.len();
        self.put(
            array,
            "length",
            PropertyDescriptor::data(Value::number(len as f64), true, false, false),
        );
        for (i, value) in elements.into_iter().enumerate() {
            self.put(
                array,
                &i.to_string(),
                PropertyDescriptor::data(value, true, true, true),
            );
        }
        array
    }

    /// A function object with standard `length` and `name` properties
    pub fn create_function(&mut self, name: &str, length: u32) -> ObjectId {
        let proto = self.intrinsics.function_prototype;
        let function = self.alloc(ObjectData::new(
            ObjectClass::Function {
                name: name.to_string(),
                length,
            },
            Some(proto),
        ));
        self.put(
            function,
            "length",
            PropertyDescriptor::data(Value::number(f64::from(length)), false, false, true),
        );
        self.put(
            function,
            "name",
            PropertyDescriptor::data(Value::string(name), false, false, true),
        );
        function
    }

    /// An error instance
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> ObjectId {
        let proto = self.intrinsics.error_prototype;
        let error = self.alloc(ObjectData::new(ObjectClass::Error(kind), Some(proto)));
        self.put(
            error,
            "message",
            PropertyDescriptor::data(Value::string(message), true, false, true),
        );
        error
    }

    /// A new unique symbol
    pub fn new_symbol(&mut self) -> SymbolId {
        let id = SymbolId(self.next_symbol);
        self.next_symbol += 1;
        id
    }

    /// The object's class
    pub fn class(&self, object: ObjectId) -> Result<&ObjectClass, JsError> {
        Ok(&self.data(object)?.class)
    }

    /// Whether the object is callable
    pub fn is_callable(&self, object: ObjectId) -> bool {
        matches!(self.class(object), Ok(ObjectClass::Function { .. }))
    }

    /// [[GetPrototypeOf]]
    pub fn prototype_of(&self, object: ObjectId) -> Result<Option<ObjectId>, JsError> {
        Ok(self.data(object)?.prototype)
    }

    /// [[SetPrototypeOf]]; refuses cycles and non-extensible targets
    pub fn set_prototype_of(
        &mut self,
        object: ObjectId,
        prototype: Option<ObjectId>,
    ) -> Result<bool, JsError> {
        let data = self.data(object)?;
        if data.prototype == prototype {
            return Ok(true);
        }
        if !data.extensible {
            return Ok(false);
        }
        let mut cursor = prototype;
        while let Some(p) = cursor {
            if p == object {
                return Ok(false);
            }
            cursor = self.data(p)?.prototype;
        }
        self.data_mut(object)?.prototype = prototype;
        Ok(true)
    }

    /// [[PreventExtensions]]
    pub fn prevent_extensions(&mut self, object: ObjectId) -> Result<(), JsError> {
        self.data_mut(object)?.extensible = false;
        Ok(())
    }

    /// [[IsExtensible]]
    pub fn is_extensible(&self, object: ObjectId) -> Result<bool, JsError> {
        Ok(self.data(object)?.extensible)
    }

    /// [[OwnPropertyKeys]]: indices ascending, then strings, then symbols
    pub fn own_keys(&self, object: ObjectId) -> Result<Vec<PropertyKey>, JsError> {
        let data = self.data(object)?;
        let mut indices: Vec<(u32, PropertyKey)> = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for (key, _) in &data.properties {
            match (array_index(key), key) {
                (Some(i), _) => indices.push((i, key.clone())),
                (None, PropertyKey::String(_)) => strings.push(key.clone()),
                (None, PropertyKey::Symbol(_)) => symbols.push(key.clone()),
            }
        }
        indices.sort_by_key(|(i, _)| *i);
        Ok(indices
            .into_iter()
            .map(|(_, k)| k)
            .chain(strings)
            .chain(symbols)
            .collect())
    }

    /// Elements `0..length` of an array-like
    pub fn array_elements(&self, object: ObjectId) -> Result<Vec<Value>, JsError> {
        let len = self
            .get(object, &length_key())?
            .as_number()
            .unwrap_or(0.0)
            .max(0.0) as u32;
        (0..len).map(|i| self.get(object, &PropertyKey::from(i))).collect()
    }

    fn lookup(
        &self,
        object: ObjectId,
        key: &PropertyKey,
    ) -> Result<Option<(ObjectId, PropertyDescriptor)>, JsError> {
        let mut cursor = Some(object);
        while let Some(id) = cursor {
            let data = self.data(id)?;
            if let Some(desc) = data.own(key) {
                return Ok(Some((id, desc.clone())));
            }
            cursor = data.prototype;
        }
        Ok(None)
    }

    fn array_length(&self, array: ObjectId) -> Result<(u32, bool), JsError> {
        let desc = self
            .data(array)?
            .own(&length_key())
            .cloned()
            .unwrap_or_else(|| PropertyDescriptor::data(Value::Smi(0), true, false, false));
        let len = desc.value.and_then(|v| v.as_number()).unwrap_or(0.0) as u32;
        Ok((len, desc.writable.unwrap_or(false)))
    }

    fn validate_and_apply(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        let data = self.data(object)?;
        let Some(index) = data.find(key) else {
            if !data.extensible {
                return Ok(false);
            }
            let data = self.data_mut(object)?;
            data.properties.push((key.clone(), complete(descriptor)));
            return Ok(true);
        };

        let current = data.properties[index].1.clone();
        if current.configurable == Some(false) {
            if descriptor.configurable == Some(true) {
                return Ok(false);
            }
            if descriptor.enumerable.is_some() && descriptor.enumerable != current.enumerable {
                return Ok(false);
            }
            let generic = !descriptor.is_accessor() && !descriptor.is_data();
            if !generic && descriptor.is_accessor() != current.is_accessor() {
                return Ok(false);
            }
            if current.is_accessor() {
                if descriptor.get.is_some() && !same_optional(&descriptor.get, &current.get) {
                    return Ok(false);
                }
                if descriptor.set.is_some() && !same_optional(&descriptor.set, &current.set) {
                    return Ok(false);
                }
            } else if current.writable == Some(false) {
                if descriptor.writable == Some(true) {
                    return Ok(false);
                }
                if descriptor.value.is_some() && !same_optional(&descriptor.value, &current.value) {
                    return Ok(false);
                }
            }
        }

        let mut updated = current.clone();
        if descriptor.is_accessor() && !current.is_accessor() {
            updated.value = None;
            updated.writable = None;
            updated.get = Some(Value::Undefined);
            updated.set = Some(Value::Undefined);
        } else if descriptor.is_data() && current.is_accessor() {
            updated.get = None;
            updated.set = None;
            updated.value = Some(Value::Undefined);
            updated.writable = Some(false);
        }
        if descriptor.value.is_some() {
            updated.value = descriptor.value;
        }
        if descriptor.writable.is_some() {
            updated.writable = descriptor.writable;
        }
        if descriptor.get.is_some() {
            updated.get = descriptor.get;
        }
        if descriptor.set.is_some() {
            updated.set = descriptor.set;
        }
        if descriptor.enumerable.is_some() {
            updated.enumerable = descriptor.enumerable;
        }
        if descriptor.configurable.is_some() {
            updated.configurable = descriptor.configurable;
        }
        self.data_mut(object)?.properties[index].1 = updated;
        Ok(true)
    }

    fn define_array_length(
        &mut self,
        array: ObjectId,
        descriptor: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        let Some(value) = descriptor.value.clone() else {
            return self.validate_and_apply(array, &length_key(), descriptor);
        };
        let new_len = match value.as_number() {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => n as u32,
            _ => return Err(JsError::new(ErrorKind::RangeError, "Invalid array length")),
        };
        let (old_len, writable) = self.array_length(array)?;
        if new_len >= old_len {
            return self.validate_and_apply(array, &length_key(), descriptor);
        }
        if !writable {
            return Ok(false);
        }

        // Delete trailing elements from the end; a non-configurable one stops the shrink.
        let mut indices: Vec<u32> = self
            .data(array)?
            .properties
            .iter()
            .filter_map(|(k, _)| array_index(k))
            .filter(|i| *i >= new_len)
            .collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for i in indices {
            if !self.delete(array, &PropertyKey::from(i), false)? {
                let stopped = descriptor.clone().with_value(Value::number(f64::from(i) + 1.0));
                self.validate_and_apply(array, &length_key(), stopped)?;
                return Ok(false);
            }
        }
        self.validate_and_apply(array, &length_key(), descriptor)
    }

    /// [[DefineOwnProperty]] with array `length` bookkeeping
    pub fn define_own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        if self.data(object)?.class != ObjectClass::Array {
            return self.validate_and_apply(object, key, descriptor);
        }
        if *key == length_key() {
            return self.define_array_length(object, descriptor);
        }
        if let Some(index) = array_index(key) {
            let (len, writable) = self.array_length(object)?;
            if index >= len && !writable {
                return Ok(false);
            }
            if !self.validate_and_apply(object, key, descriptor)? {
                return Ok(false);
            }
            if index >= len {
                self.validate_and_apply(
                    object,
                    &length_key(),
                    PropertyDescriptor::new().with_value(Value::number(f64::from(index) + 1.0)),
                )?;
            }
            return Ok(true);
        }
        self.validate_and_apply(object, key, descriptor)
    }

    /// [[GetOwnProperty]]
    pub fn get_own_property(&self, object: ObjectId, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.objects.get(object.0)?.own(key).cloned()
    }

    /// [[Get]], walking the prototype chain.
    ///
    /// Accessors with a getter cannot run in the sandbox and raise a
    /// `TypeError`; a missing getter reads as `undefined`.
    pub fn get(&self, object: ObjectId, key: &PropertyKey) -> Result<Value, JsError> {
        match self.lookup(object, key)? {
            None => Ok(Value::Undefined),
            Some((_, desc)) if desc.is_accessor() => match desc.get {
                None | Some(Value::Undefined) => Ok(Value::Undefined),
                Some(_) => Err(JsError::type_error(format!(
                    "getter for '{}' cannot run in the sandbox heap",
                    key
                ))),
            },
            Some((_, desc)) => Ok(desc.value.unwrap_or(Value::Undefined)),
        }
    }

    /// OrdinarySet with `object` as receiver
    pub fn set(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        value: Value,
        strict: bool,
    ) -> Result<bool, JsError> {
        let succeeded = match self.lookup(object, key)? {
            Some((_, desc)) if desc.is_accessor() => match desc.set {
                None | Some(Value::Undefined) => false,
                Some(_) => {
                    return Err(JsError::type_error(format!(
                        "setter for '{}' cannot run in the sandbox heap",
                        key
                    )))
                }
            },
            Some((_, desc)) if desc.writable != Some(true) => false,
            Some((owner, _)) if owner == object => {
                self.define_own_property(object, key, PropertyDescriptor::new().with_value(value))?
            }
            _ => self.define_own_property(
                object,
                key,
                PropertyDescriptor::data(value, true, true, true),
            )?,
        };
        if !succeeded && strict {
            return Err(JsError::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                key
            )));
        }
        Ok(succeeded)
    }

    /// [[Delete]]; strict code gets a `TypeError` for non-configurable properties
    pub fn delete(&mut self, object: ObjectId, key: &PropertyKey, strict: bool) -> Result<bool, JsError> {
        let data = self.data_mut(object)?;
        let Some(index) = data.find(key) else {
            return Ok(true);
        };
        if data.properties[index].1.configurable == Some(true) {
            data.properties.remove(index);
            return Ok(true);
        }
        if strict {
            return Err(JsError::type_error(format!(
                "Cannot delete property '{}' of object",
                key
            )));
        }
        Ok(false)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectAccess for Heap {
    fn get_own_property(&self, object: ObjectId, key: &PropertyKey) -> Option<PropertyDescriptor> {
        Heap::get_own_property(self, object, key)
    }

    fn get(&self, object: ObjectId, key: &PropertyKey) -> Result<Value, JsError> {
        Heap::get(self, object, key)
    }

    fn set(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        value: Value,
        strict: bool,
    ) -> Result<bool, JsError> {
        Heap::set(self, object, key, value, strict)
    }

    fn delete(&mut self, object: ObjectId, key: &PropertyKey, strict: bool) -> Result<bool, JsError> {
        Heap::delete(self, object, key, strict)
    }

    fn define_own_property(
        &mut self,
        object: ObjectId,
        key: &PropertyKey,
        descriptor: PropertyDescriptor,
    ) -> Result<bool, JsError> {
        Heap::define_own_property(self, object, key, descriptor)
    }
}
