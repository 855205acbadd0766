// Copyright (c) 2021 Fabian Schuiki

//! This crate contains the fundamental utilities used by the rest of the
//! strom parsing pipeline.

pub mod buffer;
pub mod errors;
pub mod source;
