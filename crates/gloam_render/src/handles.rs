//! Opaque asset handles. Loading and lookup live with the asset backend.

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name {
            pub id: u16,
        }

        impl $name {
            pub const fn new(id: u16) -> Self {
                Self { id }
            }
        }
    };
}

handle!(
    /// Shader program handle.
    ShaderHandle
);
handle!(TextureHandle);
handle!(FontHandle);
