//! Engine-wide constants.

/// Length of the truncated manifest hash.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Separates a dependency name from its version pin (`libfoo@30`).
pub const VERSION_PIN_SEPARATOR: char = '@';

/// Version pin that forces the implementation variant.
pub const IMPL_VERSION_PIN: &str = "impl";

/// The unreleased API level. Sorts above every numeric level.
pub const CURRENT_API_LEVEL: &str = "current";

/// Accepted alias of [`CURRENT_API_LEVEL`].
pub const FUTURE_API_LEVEL: &str = "future";

// Axis names, in pipeline order.
pub const AXIS_ARCH: &str = "arch";
pub const AXIS_IMAGE: &str = "image";
pub const AXIS_LINK: &str = "link";
pub const AXIS_APEX: &str = "apex";
pub const AXIS_SANITIZE: &str = "sanitize";
pub const AXIS_VERSION: &str = "version";
pub const AXIS_PROFILE: &str = "profile";

pub const LINK_STATIC: &str = "static";
pub const LINK_SHARED: &str = "shared";

pub const IMAGE_CORE: &str = "";
pub const IMAGE_RAMDISK: &str = "ramdisk";
pub const IMAGE_RECOVERY: &str = "recovery";
pub const IMAGE_VENDOR: &str = "vendor";
pub const IMAGE_PRODUCT: &str = "product";

/// Prefix of deployment-unit labels on the `apex` axis.
pub const APEX_LABEL_PREFIX: &str = "apex:";

/// Prefix of requirement names created by the `profile` axis.
pub const PROFILE_LABEL_PREFIX: &str = "profile-";

/// STL names that only carry the C++ ABI layer and link against anything.
pub const PERMISSIVE_STLS: &[&str] = &["system", "ndk_system"];

// Property keys recorded by axis passes.
pub const PROP_PARTITION: &str = "partition";
pub const PROP_UNIT: &str = "unit";
pub const PROP_SANITIZER: &str = "sanitizer";
pub const PROP_STUB_VERSION: &str = "stub_version";
pub const PROP_PROFILE: &str = "profile";
