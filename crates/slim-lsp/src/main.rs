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

//! SLiM Language Server binary.
//!
//! # Usage
//!
//! ```bash
//! # Run the language server (stdio transport)
//! slim-lsp --docs /path/to/docs
//!
//! # With debug logging
//! RUST_LOG=debug slim-lsp
//! ```
//!
//! The documentation directory holds the `slim_functions.json`,
//! `eidos_functions.json`, `slim_classes.json`, `eidos_classes.json`,
//! `slim_callbacks.json`, `eidos_types.json` and `eidos_operators.json`
//! files. Clients may override every option through `initializationOptions`.

use clap::Parser;
use slim_lsp::{ServerConfig, SlimLanguageServer};
use std::path::PathBuf;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slim-lsp")]
#[command(author, version, about = "Language server for SLiM and Eidos scripts", long_about = None)]
struct Args {
    /// Directory holding the JSON documentation files
    #[arg(long, value_name = "DIR")]
    docs: Option<PathBuf>,

    /// Number of documents kept in the analysis cache
    #[arg(long, value_name = "N")]
    cache_capacity: Option<usize>,

    /// Largest document, in bytes, the server will analyze
    #[arg(long, value_name = "BYTES")]
    max_document_size: Option<usize>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        if let Some(docs) = self.docs {
            config.docs_path = Some(docs);
        }
        if let Some(capacity) = self.cache_capacity {
            config.cache_capacity = capacity;
        }
        if let Some(size) = self.max_document_size {
            config.max_document_size = size;
        }
        config
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("slim_lsp=info".parse().expect("valid log directive"))
                .add_directive("slim_core=info".parse().expect("valid log directive"))
                .add_directive("tower_lsp=info".parse().expect("valid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();
    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(2);
    }

    tracing::info!("Starting SLiM Language Server v{}", slim_lsp::VERSION);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(move |client| SlimLanguageServer::with_config(client, config));

    Server::new(stdin, stdout, socket).serve(service).await;
}
