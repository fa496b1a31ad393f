//! ClassRuntime trait: the native object runtime seam
//!
//! Member lookups that depend on what a live class actually implements
//! (`*_in_class`, `initializers*`) ask this trait instead of calling into
//! the native runtime directly. Embedders implement it over their runtime;
//! tests implement it over plain sets of selectors.

/// Answers whether a native class responds to a selector.
pub trait ClassRuntime {
    /// Handle identifying a native class
    type Class: Copy;

    /// Whether `class` implements `selector`; `is_static` asks about the
    /// class object rather than its instances.
    fn responds_to_selector(&self, class: Self::Class, selector: &str, is_static: bool) -> bool;
}

impl<R: ClassRuntime + ?Sized> ClassRuntime for &R {
    type Class = R::Class;

    fn responds_to_selector(&self, class: Self::Class, selector: &str, is_static: bool) -> bool {
        (**self).responds_to_selector(class, selector, is_static)
    }
}

/// A runtime in which every class implements every selector.
///
/// Lets the `*_in_class` queries run over metadata alone, where the answer
/// reduces to the availability filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeImplemented;

impl ClassRuntime for AssumeImplemented {
    type Class = ();

    fn responds_to_selector(&self, _class: (), _selector: &str, _is_static: bool) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Only(&'static str);

    impl ClassRuntime for Only {
        type Class = u32;

        fn responds_to_selector(&self, class: u32, selector: &str, is_static: bool) -> bool {
            class == 1 && !is_static && selector == self.0
        }
    }

    fn ask<R: ClassRuntime<Class = u32>>(runtime: R, class: u32, is_static: bool) -> bool {
        runtime.responds_to_selector(class, "init", is_static)
    }

    #[test]
    fn test_reference_forwards() {
        let rt = Only("init");
        assert!(ask(&rt, 1, false));
        assert!(!ask(&rt, 1, true));
        assert!(!ask(&rt, 2, false));
        assert!(ask(&&rt, 1, false));
    }

    #[test]
    fn test_assume_implemented() {
        assert!(AssumeImplemented.responds_to_selector((), "anything:", true));
    }
}
