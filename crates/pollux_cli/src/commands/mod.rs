pub(crate) mod migrate;
pub(crate) mod platforms;
pub(crate) mod shared;
pub(crate) mod sync;
