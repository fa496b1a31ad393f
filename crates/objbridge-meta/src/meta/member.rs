//! Method and property records, member collections and overload selection

use super::flags::{MethodFlags, PropertyFlags};
use super::record::encoding_list;
use super::{record_view, MetaHeader, MetaRecord};
use crate::encoding::{EncodingList, TypeEncoding};
use crate::runtime::ClassRuntime;
use rustc_hash::{FxHashMap, FxHashSet};

/// Which member array of a class or protocol to search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MemberKind {
    /// Instance method
    InstanceMethod = 0,
    /// Class (static) method
    StaticMethod = 1,
    /// Instance property
    InstanceProperty = 2,
    /// Class (static) property
    StaticProperty = 3,
}

impl MemberKind {
    /// Whether the member lives on the class object
    pub fn is_static(self) -> bool {
        matches!(self, MemberKind::StaticMethod | MemberKind::StaticProperty)
    }

    /// Whether the member is a method
    pub fn is_method(self) -> bool {
        matches!(self, MemberKind::InstanceMethod | MemberKind::StaticMethod)
    }
}

/// A method: signature encodings plus constructor tokens
#[derive(Clone, Copy)]
pub struct MethodMeta<'a> {
    header: MetaHeader<'a>,
}

record_view!(MethodMeta);

impl<'a> MethodMeta<'a> {
    /// Method flags
    pub fn flags(&self) -> MethodFlags {
        MethodFlags::from_bits(self.header.flags())
    }

    /// Optional protocol requirement
    pub fn is_optional(&self) -> bool {
        self.flags().optional
    }

    /// Takes a variable argument list
    pub fn is_variadic(&self) -> bool {
        self.flags().variadic
    }

    /// Variable argument list terminated by nil
    pub fn is_variadic_null_terminated(&self) -> bool {
        self.flags().null_terminated_variadic
    }

    /// Last parameter is an error out-parameter
    pub fn has_error_out_parameter(&self) -> bool {
        self.flags().has_error_out_parameter
    }

    /// Belongs to the init family
    pub fn is_initializer(&self) -> bool {
        self.flags().initializer
    }

    /// Caller owns the returned object
    pub fn owns_returned_object(&self) -> bool {
        self.flags().owns_returned_object
    }

    /// Selector string (the native name)
    pub fn selector(&self) -> &'a str {
        self.header.name()
    }

    /// Return type followed by the parameters
    pub fn encodings(&self) -> EncodingList<'a> {
        encoding_list(self.header, 0)
    }

    /// Return type encoding
    pub fn return_type(&self) -> Option<TypeEncoding<'a>> {
        self.encodings().first()
    }

    /// Number of declared parameters
    pub fn parameter_count(&self) -> usize {
        self.encodings().len().saturating_sub(1)
    }

    /// Keyword tokens used to match keyword-style construction, e.g.
    /// `"frame:style:"`
    pub fn constructor_tokens(&self) -> Option<&'a str> {
        self.header.read_ptr::<&'a str>(4).value(self.header.file())
    }

    /// Whether `class` actually implements the method at run time
    pub fn is_implemented_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        is_static: bool,
    ) -> bool {
        runtime.responds_to_selector(class, self.selector(), is_static)
    }

    /// Available on the system version and implemented by `class`
    pub fn is_available_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        is_static: bool,
    ) -> bool {
        self.is_available() && self.is_implemented_in_class(runtime, class, is_static)
    }
}

/// A property: up to two accessor methods
#[derive(Clone, Copy)]
pub struct PropertyMeta<'a> {
    header: MetaHeader<'a>,
}

record_view!(PropertyMeta);

impl<'a> PropertyMeta<'a> {
    /// Property flags
    pub fn flags(&self) -> PropertyFlags {
        PropertyFlags::from_bits(self.header.flags())
    }

    /// Optional protocol requirement
    pub fn is_optional(&self) -> bool {
        self.flags().optional
    }

    /// Has a getter method
    pub fn has_getter(&self) -> bool {
        self.flags().has_getter
    }

    /// Has a setter method
    pub fn has_setter(&self) -> bool {
        self.flags().has_setter
    }

    fn method(&self, slot: usize) -> Option<MethodMeta<'a>> {
        self.header
            .read_ptr::<MethodMeta<'a>>(slot * 4)
            .value(self.header.file())
    }

    /// Getter; stored in the first slot when present
    pub fn getter(&self) -> Option<MethodMeta<'a>> {
        if self.has_getter() {
            self.method(0)
        } else {
            None
        }
    }

    /// Setter; stored after the getter, or first when there is no getter
    pub fn setter(&self) -> Option<MethodMeta<'a>> {
        match (self.has_getter(), self.has_setter()) {
            (_, false) => None,
            (true, true) => self.method(1),
            (false, true) => self.method(0),
        }
    }

    /// Whether `class` implements the getter or the setter
    pub fn is_implemented_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        is_static: bool,
    ) -> bool {
        let getter = self
            .getter()
            .is_some_and(|m| m.is_implemented_in_class(runtime, class, is_static));
        let setter = self
            .setter()
            .is_some_and(|m| m.is_implemented_in_class(runtime, class, is_static));
        getter || setter
    }

    /// Available on the system version and implemented by `class`
    pub fn is_available_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        is_static: bool,
    ) -> bool {
        self.is_available() && self.is_implemented_in_class(runtime, class, is_static)
    }
}

/// A method or a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberMeta<'a> {
    /// Method
    Method(MethodMeta<'a>),
    /// Property
    Property(PropertyMeta<'a>),
}

impl<'a> MemberMeta<'a> {
    /// The common header
    pub fn header(&self) -> MetaHeader<'a> {
        match self {
            MemberMeta::Method(m) => m.header(),
            MemberMeta::Property(p) => p.header(),
        }
    }

    /// Name exposed to scripts
    pub fn js_name(&self) -> &'a str {
        self.header().js_name()
    }

    /// Optional protocol requirement
    pub fn is_optional(&self) -> bool {
        match self {
            MemberMeta::Method(m) => m.is_optional(),
            MemberMeta::Property(p) => p.is_optional(),
        }
    }

    /// Available on the file's system version
    pub fn is_available(&self) -> bool {
        self.header().is_available()
    }

    /// Method view
    pub fn as_method(&self) -> Option<MethodMeta<'a>> {
        match self {
            MemberMeta::Method(m) => Some(*m),
            MemberMeta::Property(_) => None,
        }
    }

    /// Property view
    pub fn as_property(&self) -> Option<PropertyMeta<'a>> {
        match self {
            MemberMeta::Property(p) => Some(*p),
            MemberMeta::Method(_) => None,
        }
    }

    /// Available on the system version and implemented by `class`
    pub fn is_available_in_class<R: ClassRuntime>(
        &self,
        runtime: &R,
        class: R::Class,
        is_static: bool,
    ) -> bool {
        match self {
            MemberMeta::Method(m) => m.is_available_in_class(runtime, class, is_static),
            MemberMeta::Property(p) => p.is_available_in_class(runtime, class, is_static),
        }
    }
}

impl<'a> From<MethodMeta<'a>> for MemberMeta<'a> {
    fn from(method: MethodMeta<'a>) -> Self {
        MemberMeta::Method(method)
    }
}

impl<'a> From<PropertyMeta<'a>> for MemberMeta<'a> {
    fn from(property: PropertyMeta<'a>) -> Self {
        MemberMeta::Property(property)
    }
}

/// Members de-duplicated by record identity, in insertion order
#[derive(Debug, Clone, Default)]
pub struct MembersCollection<'a> {
    members: Vec<MemberMeta<'a>>,
    seen: FxHashSet<usize>,
}

impl<'a> MembersCollection<'a> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member; returns false if the same record is already present
    pub fn insert(&mut self, member: MemberMeta<'a>) -> bool {
        if !self.seen.insert(member.header().position()) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Whether the record is present
    pub fn contains(&self, member: &MemberMeta<'a>) -> bool {
        self.seen.contains(&member.header().position())
    }

    /// Number of distinct members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// First member inserted
    pub fn first(&self) -> Option<MemberMeta<'a>> {
        self.members.first().copied()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = MemberMeta<'a>> + '_ {
        self.members.iter().copied()
    }

    /// Only the methods, in insertion order
    pub fn methods(&self) -> impl Iterator<Item = MethodMeta<'a>> + '_ {
        self.members.iter().filter_map(MemberMeta::as_method)
    }

    /// Keep only members satisfying `keep`
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&MemberMeta<'a>) -> bool,
    {
        let seen = &mut self.seen;
        self.members.retain(|m| {
            let kept = keep(m);
            if !kept {
                seen.remove(&m.header().position());
            }
            kept
        });
    }

    /// Group by scripting name
    pub fn by_js_name(&self) -> FxHashMap<&'a str, MembersCollection<'a>> {
        let mut groups: FxHashMap<&'a str, MembersCollection<'a>> = FxHashMap::default();
        for member in self.iter() {
            groups.entry(member.js_name()).or_default().insert(member);
        }
        groups
    }

    /// Consume into the ordered member list
    pub fn into_vec(self) -> Vec<MemberMeta<'a>> {
        self.members
    }
}

impl<'a> Extend<MemberMeta<'a>> for MembersCollection<'a> {
    fn extend<I: IntoIterator<Item = MemberMeta<'a>>>(&mut self, iter: I) {
        for member in iter {
            self.insert(member);
        }
    }
}

impl<'a> IntoIterator for MembersCollection<'a> {
    type Item = MemberMeta<'a>;
    type IntoIter = std::vec::IntoIter<MemberMeta<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

/// Pick the overload to call with `args_count` arguments.
///
/// Preference: an exact arity match; otherwise the smallest arity above
/// `args_count`; otherwise the largest arity below it. One pass, first
/// candidate wins ties. `None` only when there are no candidates.
pub fn select_overload<T, I, F>(candidates: I, args_count: usize, arity: F) -> Option<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> usize,
{
    let mut best: Option<(T, usize)> = None;
    for candidate in candidates {
        let candidate_args = arity(&candidate);
        if candidate_args == args_count {
            return Some(candidate);
        }
        let better = match &best {
            None => true,
            Some((_, best_args)) if candidate_args > args_count => {
                *best_args < args_count || candidate_args < *best_args
            }
            Some((_, best_args)) => *best_args < args_count && candidate_args > *best_args,
        };
        if better {
            best = Some((candidate, candidate_args));
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick(arities: &[usize], requested: usize) -> Option<usize> {
        select_overload(arities.iter().copied(), requested, |n| *n)
    }

    #[test]
    fn test_exact_match_wins() {
        assert_eq!(pick(&[1, 3], 3), Some(3));
        assert_eq!(pick(&[4, 3, 1], 3), Some(3));
    }

    #[test]
    fn test_smallest_above_requested() {
        assert_eq!(pick(&[1, 2, 4], 3), Some(4));
        assert_eq!(pick(&[6, 1, 4, 5], 3), Some(4));
    }

    #[test]
    fn test_largest_below_requested() {
        assert_eq!(pick(&[1, 2, 4], 5), Some(4));
        assert_eq!(pick(&[2, 0, 1], 5), Some(2));
    }

    #[test]
    fn test_above_beats_below_regardless_of_order() {
        assert_eq!(pick(&[7, 2], 3), Some(7));
        assert_eq!(pick(&[2, 7], 3), Some(7));
    }

    #[test]
    fn test_ties_keep_first_encountered() {
        let candidates = [("a", 4), ("b", 4), ("c", 1)];
        let chosen = select_overload(candidates.iter(), 2, |c| c.1).unwrap();
        assert_eq!(chosen.0, "a");
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(pick(&[], 2), None);
    }

    #[test]
    fn test_member_kind_predicates() {
        assert!(MemberKind::StaticProperty.is_static());
        assert!(!MemberKind::InstanceMethod.is_static());
        assert!(MemberKind::StaticMethod.is_method());
        assert!(!MemberKind::InstanceProperty.is_method());
    }
}
