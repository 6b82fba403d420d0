// Dweve SLiM Tools - Editor intelligence for SLiM and Eidos scripts
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Server start-up errors.

use slim_core::SlimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LspError {
    /// Documentation loading or engine configuration failed.
    #[error(transparent)]
    Core(#[from] SlimError),

    /// `initializationOptions` did not match the expected shape.
    #[error("invalid initialization options: {0}")]
    InitializationOptions(#[from] serde_json::Error),

    /// A server setting is out of range.
    #[error("invalid server configuration: {0}")]
    InvalidConfig(String),
}

pub type LspResult<T> = Result<T, LspError>;
