// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Named buffers owned by an observation.

A buffer is created once under a name and lives until it is destroyed. Asking
for a buffer that was never made, or that has been destroyed, is an error;
nothing is ever created implicitly.
 */


use std::collections::{BTreeMap, BTreeSet};

use log::trace;
use ndarray::prelude::*;
use thiserror::Error;

/// Boresight quaternions in the horizontal frame.
pub const BORESIGHT_AZEL: &str = "boresight_azel";
/// Boresight quaternions in the sky frame.
pub const BORESIGHT_RADEC: &str = "boresight_radec";
pub const HWP_ANGLE: &str = "hwp_angle";

/// The name of the buffer holding the `prefix` signal of `detector`.
pub fn signal_name(prefix: &str, detector: &str) -> String {
    format!("{prefix}_{detector}")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Cache buffer '{0}' doesn't exist")]
    Missing(String),

    #[error("Cache buffer '{0}' has been destroyed")]
    Destroyed(String),

    #[error("Cache buffer '{0}' already exists; destroy it before making it again")]
    AlreadyExists(String),

    #[error("Cache buffer '{name}' holds {found} data, not {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("'{0}' is a simulated stream and can't be written to")]
    ReadOnly(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheBuffer {
    F64(Array1<f64>),
    U8(Array1<u8>),
    /// `(n, 4)` quaternions.
    Quat(Array2<f64>),
}

impl CacheBuffer {
    fn kind(&self) -> &'static str {
        match self {
            CacheBuffer::F64(_) => "f64",
            CacheBuffer::U8(_) => "u8",
            CacheBuffer::Quat(_) => "quaternion",
        }
    }

    /// The number of samples held.
    pub fn len(&self) -> usize {
        match self {
            CacheBuffer::F64(a) => a.len(),
            CacheBuffer::U8(a) => a.len(),
            CacheBuffer::Quat(a) => a.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct Cache {
    buffers: BTreeMap<String, CacheBuffer>,
    /// Names that once had a buffer.
    destroyed: BTreeSet<String>,
}

impl Cache {
    pub fn new() -> Cache {
        Cache::default()
    }

    /// Store `buffer` under `name`.
    pub fn create(&mut self, name: &str, buffer: CacheBuffer) -> Result<(), CacheError> {
        if self.buffers.contains_key(name) {
            return Err(CacheError::AlreadyExists(name.to_string()));
        }
        trace!(
            "Creating cache buffer '{name}' ({} {} samples)",
            buffer.len(),
            buffer.kind()
        );
        self.destroyed.remove(name);
        self.buffers.insert(name.to_string(), buffer);
        Ok(())
    }

    /// Overwrite the contents of an existing buffer. The new contents must
    /// be of the same type.
    pub fn put(&mut self, name: &str, buffer: CacheBuffer) -> Result<(), CacheError> {
        let existing = self.get_mut(name)?;
        if existing.kind() != buffer.kind() {
            return Err(CacheError::WrongType {
                name: name.to_string(),
                expected: existing.kind(),
                found: buffer.kind(),
            });
        }
        *existing = buffer;
        Ok(())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.buffers.contains_key(name)
    }

    /// Free the buffer `name`.
    pub fn destroy(&mut self, name: &str) -> Result<(), CacheError> {
        match self.buffers.remove(name) {
            Some(_) => {
                trace!("Destroyed cache buffer '{name}'");
                self.destroyed.insert(name.to_string());
                Ok(())
            }
            None => Err(self.absent(name)),
        }
    }

    /// Destroy every buffer whose name starts with `prefix`, returning how
    /// many there were.
    pub fn clear(&mut self, prefix: &str) -> usize {
        let names: Vec<String> = self
            .buffers
            .keys()
            .filter(|n| n.starts_with(prefix))
            .cloned()
            .collect();
        for name in &names {
            self.buffers.remove(name);
            self.destroyed.insert(name.clone());
        }
        names.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(|s| s.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&CacheBuffer, CacheError> {
        self.buffers.get(name).ok_or_else(|| self.absent(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut CacheBuffer, CacheError> {
        if !self.buffers.contains_key(name) {
            return Err(self.absent(name));
        }
        self.buffers
            .get_mut(name)
            .ok_or_else(|| CacheError::Missing(name.to_string()))
    }

    pub fn f64(&self, name: &str) -> Result<ArrayView1<f64>, CacheError> {
        match self.get(name)? {
            CacheBuffer::F64(a) => Ok(a.view()),
            other => Err(wrong_type(name, "f64", other)),
        }
    }

    pub fn f64_mut(&mut self, name: &str) -> Result<ArrayViewMut1<f64>, CacheError> {
        match self.get_mut(name)? {
            CacheBuffer::F64(a) => Ok(a.view_mut()),
            other => Err(wrong_type(name, "f64", other)),
        }
    }

    pub fn u8(&self, name: &str) -> Result<ArrayView1<u8>, CacheError> {
        match self.get(name)? {
            CacheBuffer::U8(a) => Ok(a.view()),
            other => Err(wrong_type(name, "u8", other)),
        }
    }

    pub fn quats(&self, name: &str) -> Result<ArrayView2<f64>, CacheError> {
        match self.get(name)? {
            CacheBuffer::Quat(a) => Ok(a.view()),
            other => Err(wrong_type(name, "quaternion", other)),
        }
    }

    fn absent(&self, name: &str) -> CacheError {
        if self.destroyed.contains(name) {
            CacheError::Destroyed(name.to_string())
        } else {
            CacheError::Missing(name.to_string())
        }
    }
}

fn wrong_type(name: &str, expected: &'static str, found: &CacheBuffer) -> CacheError {
    CacheError::WrongType {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
