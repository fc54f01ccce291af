//! Readers turning description documents into the register model

pub(crate) mod svd_stream;
