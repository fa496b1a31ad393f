//! Per-kind flag sets
//!
//! The blob packs flags into one byte per record and reuses bit positions
//! across unrelated kinds (bit 0 is "optional" on members but "framework"
//! on modules). Each kind gets its own typed set here; the bit layout only
//! exists in `from_bits`/`to_bits`.

/// Bit 7 of a meta header: the record carries a (js name, native name) pair
pub(crate) const HAS_NAME: u8 = 7;

/// Low three bits of a top-level meta header hold the kind tag
pub(crate) const KIND_MASK: u8 = 0b0000_0111;

const FUNCTION_RETURNS_UNMANAGED: u8 = 3;
const FUNCTION_OWNS_RETURNED_OBJECT: u8 = 4;
const FUNCTION_IS_VARIADIC: u8 = 5;

const MEMBER_IS_OPTIONAL: u8 = 0;
const METHOD_IS_INITIALIZER: u8 = 1;
const METHOD_IS_VARIADIC: u8 = 2;
const METHOD_IS_NULL_TERMINATED_VARIADIC: u8 = 3;
const METHOD_OWNS_RETURNED_OBJECT: u8 = 4;
const METHOD_HAS_ERROR_OUT_PARAMETER: u8 = 5;
const PROPERTY_HAS_GETTER: u8 = 2;
const PROPERTY_HAS_SETTER: u8 = 3;

const MODULE_IS_FRAMEWORK: u8 = 0;
const MODULE_IS_SYSTEM: u8 = 1;

fn bit(bits: u8, index: u8) -> bool {
    bits & (1 << index) != 0
}

fn set(value: bool, index: u8) -> u8 {
    (value as u8) << index
}

/// Flags of a C function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionFlags {
    /// Takes a variable argument list
    pub variadic: bool,
    /// Returns an object whose memory is not managed by the runtime
    pub returns_unmanaged: bool,
    /// Caller owns the returned object
    pub owns_returned_object: bool,
}

impl FunctionFlags {
    /// Decode from a header flags byte
    pub fn from_bits(bits: u8) -> Self {
        Self {
            variadic: bit(bits, FUNCTION_IS_VARIADIC),
            returns_unmanaged: bit(bits, FUNCTION_RETURNS_UNMANAGED),
            owns_returned_object: bit(bits, FUNCTION_OWNS_RETURNED_OBJECT),
        }
    }

    /// Encode into header flag bits
    pub fn to_bits(self) -> u8 {
        set(self.variadic, FUNCTION_IS_VARIADIC)
            | set(self.returns_unmanaged, FUNCTION_RETURNS_UNMANAGED)
            | set(self.owns_returned_object, FUNCTION_OWNS_RETURNED_OBJECT)
    }
}

/// Flags of a method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodFlags {
    /// Optional protocol requirement
    pub optional: bool,
    /// Belongs to the init family
    pub initializer: bool,
    /// Takes a variable argument list
    pub variadic: bool,
    /// Variable argument list terminated by nil
    pub null_terminated_variadic: bool,
    /// Caller owns the returned object
    pub owns_returned_object: bool,
    /// Last parameter is an error out-parameter
    pub has_error_out_parameter: bool,
}

impl MethodFlags {
    /// Decode from a header flags byte
    pub fn from_bits(bits: u8) -> Self {
        Self {
            optional: bit(bits, MEMBER_IS_OPTIONAL),
            initializer: bit(bits, METHOD_IS_INITIALIZER),
            variadic: bit(bits, METHOD_IS_VARIADIC),
            null_terminated_variadic: bit(bits, METHOD_IS_NULL_TERMINATED_VARIADIC),
            owns_returned_object: bit(bits, METHOD_OWNS_RETURNED_OBJECT),
            has_error_out_parameter: bit(bits, METHOD_HAS_ERROR_OUT_PARAMETER),
        }
    }

    /// Encode into header flag bits
    pub fn to_bits(self) -> u8 {
        set(self.optional, MEMBER_IS_OPTIONAL)
            | set(self.initializer, METHOD_IS_INITIALIZER)
            | set(self.variadic, METHOD_IS_VARIADIC)
            | set(self.null_terminated_variadic, METHOD_IS_NULL_TERMINATED_VARIADIC)
            | set(self.owns_returned_object, METHOD_OWNS_RETURNED_OBJECT)
            | set(self.has_error_out_parameter, METHOD_HAS_ERROR_OUT_PARAMETER)
    }
}

/// Flags of a property
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyFlags {
    /// Optional protocol requirement
    pub optional: bool,
    /// Has a getter method
    pub has_getter: bool,
    /// Has a setter method
    pub has_setter: bool,
}

impl PropertyFlags {
    /// Decode from a header flags byte
    pub fn from_bits(bits: u8) -> Self {
        Self {
            optional: bit(bits, MEMBER_IS_OPTIONAL),
            has_getter: bit(bits, PROPERTY_HAS_GETTER),
            has_setter: bit(bits, PROPERTY_HAS_SETTER),
        }
    }

    /// Encode into header flag bits
    pub fn to_bits(self) -> u8 {
        set(self.optional, MEMBER_IS_OPTIONAL)
            | set(self.has_getter, PROPERTY_HAS_GETTER)
            | set(self.has_setter, PROPERTY_HAS_SETTER)
    }
}

/// Flags of a module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleFlags {
    /// Module is a framework bundle
    pub framework: bool,
    /// Module ships with the system
    pub system: bool,
}

impl ModuleFlags {
    /// Decode from a module flags byte
    pub fn from_bits(bits: u8) -> Self {
        Self {
            framework: bit(bits, MODULE_IS_FRAMEWORK),
            system: bit(bits, MODULE_IS_SYSTEM),
        }
    }

    /// Encode into a module flags byte
    pub fn to_bits(self) -> u8 {
        set(self.framework, MODULE_IS_FRAMEWORK) | set(self.system, MODULE_IS_SYSTEM)
    }
}

/// Flags of a linked library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryFlags {
    /// Library is a framework
    pub framework: bool,
}

impl LibraryFlags {
    /// Decode from a library flags byte
    pub fn from_bits(bits: u8) -> Self {
        Self {
            framework: bit(bits, MODULE_IS_FRAMEWORK),
        }
    }

    /// Encode into a library flags byte
    pub fn to_bits(self) -> u8 {
        set(self.framework, MODULE_IS_FRAMEWORK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_bits() {
        let flags = MethodFlags {
            initializer: true,
            has_error_out_parameter: true,
            ..Default::default()
        };
        assert_eq!(flags.to_bits(), 0b0010_0010);
        assert_eq!(MethodFlags::from_bits(flags.to_bits()), flags);
    }

    #[test]
    fn test_function_bits_leave_kind_and_name_bits_free() {
        let all = FunctionFlags {
            variadic: true,
            returns_unmanaged: true,
            owns_returned_object: true,
        };
        assert_eq!(all.to_bits() & KIND_MASK, 0);
        assert_eq!(all.to_bits() & (1 << HAS_NAME), 0);
    }

    #[test]
    fn test_same_bit_means_different_things() {
        let bits = 0b0000_0001;
        assert!(PropertyFlags::from_bits(bits).optional);
        assert!(ModuleFlags::from_bits(bits).framework);
        assert!(!ModuleFlags::from_bits(bits).system);
        assert!(LibraryFlags::from_bits(bits).framework);
    }

    #[test]
    fn test_property_accessor_bits() {
        let flags = PropertyFlags::from_bits(0b0000_1100);
        assert!(flags.has_getter && flags.has_setter && !flags.optional);
    }
}
