//! Interfaces and protocols
//!
//! Both share the member-bearing tail modelled by [`BaseClassMeta`]:
//! four sorted member arrays, the adopted protocol names and the index of
//! the first initializer among the instance methods. Interfaces append the
//! name of their base class.

use super::member::{select_overload, MemberKind, MemberMeta, MembersCollection};
use super::{MetaHeader, MetaRecord, MethodMeta, PropertyMeta};
use crate::heap::{read_i16, Array, FromHeap, RelPtr};
use crate::runtime::ClassRuntime;
use rustc_hash::FxHashSet;
use std::fmt;
use std::ops::Deref;

const INSTANCE_METHODS: usize = 0;
const STATIC_METHODS: usize = 4;
const INSTANCE_PROPERTIES: usize = 8;
const STATIC_PROPERTIES: usize = 12;
const PROTOCOLS: usize = 16;
const INITIALIZERS_START: usize = 20;
const BASE_NAME: usize = 22;

/// Member-bearing view shared by interfaces and protocols
#[derive(Clone, Copy)]
pub struct BaseClassMeta<'a> {
    header: MetaHeader<'a>,
}

super::record_view!(BaseClassMeta);

impl<'a> BaseClassMeta<'a> {
    /// Instance methods sorted by scripting name
    pub fn instance_methods(&self) -> Array<'a, RelPtr<MethodMeta<'a>>> {
        Array::resolve(self.header.read_ptr(INSTANCE_METHODS), self.header.file())
    }

    /// Static methods sorted by scripting name
    pub fn static_methods(&self) -> Array<'a, RelPtr<MethodMeta<'a>>> {
        Array::resolve(self.header.read_ptr(STATIC_METHODS), self.header.file())
    }

    /// Instance properties sorted by scripting name
    pub fn instance_properties_array(&self) -> Array<'a, RelPtr<PropertyMeta<'a>>> {
        Array::resolve(self.header.read_ptr(INSTANCE_PROPERTIES), self.header.file())
    }

    /// Static properties sorted by scripting name
    pub fn static_properties_array(&self) -> Array<'a, RelPtr<PropertyMeta<'a>>> {
        Array::resolve(self.header.read_ptr(STATIC_PROPERTIES), self.header.file())
    }

    /// Names of the adopted protocols
    pub fn protocol_names(&self) -> Array<'a, RelPtr<&'a str>> {
        Array::resolve(self.header.read_ptr(PROTOCOLS), self.header.file())
    }

    /// Adopted protocols that resolve in the Global Table, in declaration order
    pub fn protocols(&self) -> impl Iterator<Item = ProtocolMeta<'a>> + 'a {
        let file = self.header.file();
        self.protocol_names()
            .iter()
            .filter_map(move |name| name.value(file))
            .filter_map(move |name| file.global_table().find_protocol(name))
    }

    /// Index of the first initializer in [`Self::instance_methods`]
    pub fn initializers_start_index(&self) -> Option<usize> {
        let index = read_i16(self.header.file().blob(), self.header.tail(INITIALIZERS_START));
        (index >= 0).then_some(index as usize)
    }

    /// First member named `name`, searching own members before protocols.
    pub fn member(
        &self,
        name: &str,
        kind: MemberKind,
        include_protocols: bool,
        only_if_available: bool,
    ) -> Option<MemberMeta<'a>> {
        self.members(name, kind, include_protocols, only_if_available)
            .first()
    }

    /// Every member named `name`: all overloads of a method, own members
    /// first, then the members of adopted protocols (transitively, each
    /// protocol at most once).
    pub fn members(
        &self,
        name: &str,
        kind: MemberKind,
        include_protocols: bool,
        only_if_available: bool,
    ) -> MembersCollection<'a> {
        let mut result = MembersCollection::new();
        let mut visited = FxHashSet::default();
        visited.insert(self.position());
        self.collect_members(
            name.as_bytes(),
            kind,
            include_protocols,
            only_if_available,
            &mut result,
            &mut visited,
        );
        result
    }

    fn collect_members(
        &self,
        name: &[u8],
        kind: MemberKind,
        include_protocols: bool,
        only_if_available: bool,
        out: &mut MembersCollection<'a>,
        visited: &mut FxHashSet<usize>,
    ) {
        match kind {
            MemberKind::InstanceMethod => {
                collect_named(self.instance_methods(), name, only_if_available, out)
            }
            MemberKind::StaticMethod => {
                collect_named(self.static_methods(), name, only_if_available, out)
            }
            MemberKind::InstanceProperty => {
                collect_named(self.instance_properties_array(), name, only_if_available, out)
            }
            MemberKind::StaticProperty => {
                collect_named(self.static_properties_array(), name, only_if_available, out)
            }
        }

        if !include_protocols {
            return;
        }
        for protocol in self.protocols() {
            if !visited.insert(protocol.position()) {
                log::trace!(
                    "protocol {} already searched from {}",
                    protocol.js_name(),
                    self.js_name()
                );
                continue;
            }
            protocol.collect_members(name, kind, true, only_if_available, out, visited);
        }
    }

    /// First method named `name` declaring exactly `params` parameters
    pub fn method_with_arity(
        &self,
        name: &str,
        kind: MemberKind,
        params: usize,
        include_protocols: bool,
        only_if_available: bool,
    ) -> Option<MethodMeta<'a>> {
        self.members(name, kind, include_protocols, only_if_available)
            .methods()
            .find(|m| m.parameter_count() == params)
    }

    /// Best overload named `name` for a call with `args_count` arguments
    /// (see [`select_overload`]).
    pub fn best_method(
        &self,
        name: &str,
        kind: MemberKind,
        args_count: usize,
        include_protocols: bool,
    ) -> Option<MethodMeta<'a>> {
        let members = self.members(name, kind, include_protocols, true);
        select_overload(members.methods(), args_count, MethodMeta::parameter_count)
    }

    /// Instance methods named `name` that `class` implements
    pub fn instance_methods_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        name: &str,
        include_protocols: bool,
    ) -> MembersCollection<'a> {
        let mut methods = self.members(name, MemberKind::InstanceMethod, include_protocols, true);
        methods.retain(|m| m.is_available_in_class(runtime, class, false));
        methods
    }

    /// Static methods named `name` that `class` implements
    pub fn static_methods_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        name: &str,
        include_protocols: bool,
    ) -> MembersCollection<'a> {
        let mut methods = self.members(name, MemberKind::StaticMethod, include_protocols, true);
        methods.retain(|m| m.is_available_in_class(runtime, class, true));
        methods
    }

    /// Instance property named `name`, if `class` implements it
    pub fn instance_property_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        name: &str,
        include_protocols: bool,
    ) -> Option<PropertyMeta<'a>> {
        self.member(name, MemberKind::InstanceProperty, include_protocols, true)
            .and_then(|m| m.as_property())
            .filter(|p| p.is_available_in_class(runtime, class, false))
    }

    /// Static property named `name`, if `class` implements it
    pub fn static_property_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        name: &str,
        include_protocols: bool,
    ) -> Option<PropertyMeta<'a>> {
        self.member(name, MemberKind::StaticProperty, include_protocols, true)
            .and_then(|m| m.as_property())
            .filter(|p| p.is_available_in_class(runtime, class, true))
    }

    /// Own instance properties implemented by `class`
    pub fn instance_properties<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
    ) -> Vec<PropertyMeta<'a>> {
        let mut out = Vec::new();
        self.push_properties(&mut out, runtime, class, false);
        out
    }

    /// Own and protocol instance properties implemented by `class`
    pub fn instance_properties_with_protocols<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
    ) -> Vec<PropertyMeta<'a>> {
        let mut out = Vec::new();
        self.walk_protocols(|meta| meta.push_properties(&mut out, runtime, class, false));
        out
    }

    /// Own static properties implemented by `class`
    pub fn static_properties<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
    ) -> Vec<PropertyMeta<'a>> {
        let mut out = Vec::new();
        self.push_properties(&mut out, runtime, class, true);
        out
    }

    /// Own and protocol static properties implemented by `class`
    pub fn static_properties_with_protocols<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
    ) -> Vec<PropertyMeta<'a>> {
        let mut out = Vec::new();
        self.walk_protocols(|meta| meta.push_properties(&mut out, runtime, class, true));
        out
    }

    fn push_properties<R: ClassRuntime>(
        &self,
        out: &mut Vec<PropertyMeta<'a>>,
        runtime: &R,
        class: R::Class,
        is_static: bool,
    ) {
        let file = self.header.file();
        let array = if is_static {
            self.static_properties_array()
        } else {
            self.instance_properties_array()
        };
        out.extend(
            array
                .iter()
                .filter_map(|p| p.value(file))
                .filter(|p| p.is_available_in_class(runtime, class, is_static)),
        );
    }

    /// Instance methods of the init family as stored, starting at the
    /// initializer start index and stopping at the first non-initializer.
    pub fn declared_initializers(&self) -> impl Iterator<Item = MethodMeta<'a>> + 'a {
        let file = self.header.file();
        let methods = self.instance_methods();
        let start = self.initializers_start_index().unwrap_or(methods.len());
        methods
            .iter()
            .skip(start)
            .filter_map(move |p| p.value(file))
            .take_while(MethodMeta::is_initializer)
    }

    /// Own initializers implemented by `class`
    pub fn initializers<R: ClassRuntime>(&self, runtime: &R, class: R::Class) -> Vec<MethodMeta<'a>> {
        let mut out = Vec::new();
        self.push_initializers(&mut out, runtime, class);
        out
    }

    /// Own and protocol initializers implemented by `class`
    pub fn initializers_with_protocols<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
    ) -> Vec<MethodMeta<'a>> {
        let mut out = Vec::new();
        self.walk_protocols(|meta| meta.push_initializers(&mut out, runtime, class));
        out
    }

    pub(crate) fn push_initializers<R: ClassRuntime>(
        &self,
        out: &mut Vec<MethodMeta<'a>>,
        runtime: &R,
        class: R::Class,
    ) {
        out.extend(
            self.declared_initializers()
                .filter(|m| m.is_available_in_class(runtime, class, false)),
        );
    }

    /// Visit `self`, then every transitively adopted protocol once, depth first
    /// in declaration order.
    fn walk_protocols<F>(&self, mut visit: F)
    where
        F: FnMut(&BaseClassMeta<'a>),
    {
        let mut visited = FxHashSet::default();
        let mut stack = vec![*self];
        visited.insert(self.position());
        while let Some(meta) = stack.pop() {
            visit(&meta);
            let adopted: Vec<_> = meta.protocols().collect();
            for protocol in adopted.into_iter().rev() {
                if visited.insert(protocol.position()) {
                    stack.push(*protocol);
                }
            }
        }
    }
}

/// Add every element of `array` whose scripting name equals `name`. The
/// array is sorted by scripting name; equal names are contiguous.
fn collect_named<'a, T>(
    array: Array<'a, RelPtr<T>>,
    name: &[u8],
    only_if_available: bool,
    out: &mut MembersCollection<'a>,
) where
    T: FromHeap<'a> + MetaRecord<'a> + Into<MemberMeta<'a>>,
{
    let file = array.file();
    let compare = |ptr: &RelPtr<T>| {
        ptr.value(file)
            .map_or(&[][..], |m| m.js_name().as_bytes())
            .cmp(name)
    };
    let start = array.binary_search_leftmost(compare);
    if start < 0 {
        return;
    }
    for ptr in array.iter().skip(start as usize) {
        let Some(member) = ptr.value(file) else {
            break;
        };
        if member.js_name().as_bytes() != name {
            break;
        }
        if !only_if_available || member.is_available() {
            out.insert(member.into());
        }
    }
}

/// A class interface
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceMeta<'a> {
    class: BaseClassMeta<'a>,
}

impl<'a> InterfaceMeta<'a> {
    /// Declared base class name; `None` at the root of the hierarchy
    pub fn base_name(&self) -> Option<&'a str> {
        self.class
            .header
            .read_ptr::<&'a str>(BASE_NAME)
            .value(self.class.header.file())
    }

    /// Base interface, resolved through the Global Table
    pub fn base_meta(&self) -> Option<InterfaceMeta<'a>> {
        let base = self.base_name()?;
        self.class.header.file().global_table().find_interface_meta(base)
    }

    /// Base, base of base, ... up to the root. Stops if a class repeats.
    pub fn ancestors(&self) -> Ancestors<'a> {
        let mut visited = FxHashSet::default();
        visited.insert(self.position());
        Ancestors {
            current: Some(*self),
            visited,
        }
    }

    /// Initializers implemented by `class` at every level of the hierarchy,
    /// most derived first. Same-named initializers of different levels are
    /// all kept.
    pub fn initializers_in_hierarchy<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
    ) -> Vec<MethodMeta<'a>> {
        let mut out = Vec::new();
        self.push_initializers(&mut out, runtime, class);
        for ancestor in self.ancestors() {
            ancestor.push_initializers(&mut out, runtime, class);
        }
        out
    }
}

impl<'a> Deref for InterfaceMeta<'a> {
    type Target = BaseClassMeta<'a>;

    fn deref(&self) -> &BaseClassMeta<'a> {
        &self.class
    }
}

impl<'a> FromHeap<'a> for InterfaceMeta<'a> {
    fn from_heap(file: crate::file::MetaFile<'a>, pos: usize) -> Self {
        MetaHeader::at(file, pos).into()
    }
}

impl<'a> From<MetaHeader<'a>> for InterfaceMeta<'a> {
    fn from(header: MetaHeader<'a>) -> Self {
        Self {
            class: BaseClassMeta { header },
        }
    }
}

impl<'a> MetaRecord<'a> for InterfaceMeta<'a> {
    fn header(&self) -> MetaHeader<'a> {
        self.class.header
    }
}

impl fmt::Debug for InterfaceMeta<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceMeta")
            .field("js_name", &self.js_name())
            .field("base", &self.base_name())
            .finish()
    }
}

/// Walks an interface's base classes
pub struct Ancestors<'a> {
    current: Option<InterfaceMeta<'a>>,
    visited: FxHashSet<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = InterfaceMeta<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let base = self.current.take()?.base_meta()?;
        if !self.visited.insert(base.position()) {
            log::warn!("inheritance cycle through {}", base.js_name());
            return None;
        }
        self.current = Some(base);
        Some(base)
    }
}

/// A protocol
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolMeta<'a> {
    class: BaseClassMeta<'a>,
}

impl<'a> Deref for ProtocolMeta<'a> {
    type Target = BaseClassMeta<'a>;

    fn deref(&self) -> &BaseClassMeta<'a> {
        &self.class
    }
}

impl<'a> FromHeap<'a> for ProtocolMeta<'a> {
    fn from_heap(file: crate::file::MetaFile<'a>, pos: usize) -> Self {
        MetaHeader::at(file, pos).into()
    }
}

impl<'a> From<MetaHeader<'a>> for ProtocolMeta<'a> {
    fn from(header: MetaHeader<'a>) -> Self {
        Self {
            class: BaseClassMeta { header },
        }
    }
}

impl<'a> MetaRecord<'a> for ProtocolMeta<'a> {
    fn header(&self) -> MetaHeader<'a> {
        self.class.header
    }
}

impl fmt::Debug for ProtocolMeta<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolMeta")
            .field("js_name", &self.js_name())
            .finish()
    }
}
