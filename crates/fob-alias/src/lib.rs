//! Alias resolution for JavaScript and TypeScript import specifiers.
//!
//! `fob-alias` rewrites symbolic import prefixes such as `@/components` into
//! real module paths, using the alias definitions of an existing build-tool
//! config: a bundler config (`webpack.config.js`, `alias.config.js`, ...) or
//! a `tsconfig.json` / `jsconfig.json` with `compilerOptions.paths`.
//!
//! ```no_run
//! use fob_alias::{AliasResolver, ResolveOptions, SourceRewriter};
//! use std::path::Path;
//!
//! let resolver = AliasResolver::native();
//! let options = ResolveOptions::new().find_config(true);
//!
//! // One specifier at a time...
//! let rewritten = resolver.resolve(Path::new("src/app/main.ts"), "@/lib/api", &options)?;
//!
//! // ...or a whole file.
//! let rewriter = SourceRewriter::new(resolver, options);
//! let output = rewriter.rewrite(Path::new("src/app/main.ts"), "import api from '@/lib/api';")?;
//! println!("{}", output.code);
//! # Ok::<(), fob_alias::AliasError>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod locate;
pub mod matcher;
pub mod normalize;
pub mod options;
pub mod paths;
pub mod resolver;
pub mod rewrite;
pub mod runtime;
pub mod table;
pub mod template;
pub mod transform;

// Re-export main types
pub use cache::{CacheEntry, ConfigCache};
pub use error::{AliasError, ConfigError, Result};
pub use locate::ConfigLocator;
pub use matcher::find_match;
pub use options::{DEFAULT_CONFIG_NAMES, ResolveOptions};
pub use resolver::AliasResolver;
pub use rewrite::{RewriteContext, rewrite_specifier};
pub use runtime::{FileMetadata, NativeRuntime, Runtime, RuntimeError, RuntimeResult};
pub use table::{AliasRule, AliasTable, ConfigDescriptor, ConfigKind};
pub use transform::{
    RewriteOutput, RewriteReport, RewrittenSpecifier, SourceRewriter, SpecifierKind,
};
