//! The resolution entry point.

use std::path::Path;
use std::sync::Arc;

use crate::cache::{CacheEntry, ConfigCache};
use crate::error::{AliasError, Result};
use crate::locate::ConfigLocator;
use crate::matcher::find_match;
use crate::normalize::build_table;
use crate::options::ResolveOptions;
use crate::paths;
use crate::rewrite::{RewriteContext, rewrite_specifier};
use crate::runtime::{NativeRuntime, Runtime};
use crate::table::ConfigDescriptor;

/// Resolves aliased import specifiers.
///
/// Holds the runtime every lookup goes through and the cache of loaded
/// configs. Clones share the same cache.
///
/// # Example
///
/// ```no_run
/// use fob_alias::{AliasResolver, ResolveOptions};
/// use std::path::Path;
///
/// let resolver = AliasResolver::native();
/// let options = ResolveOptions::new().find_config(true);
///
/// match resolver.resolve(Path::new("src/app/index.js"), "@/components/Button", &options)? {
///     Some(rewritten) => println!("rewrite to {rewritten}"),
///     None => println!("leave unchanged"),
/// }
/// # Ok::<(), fob_alias::AliasError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AliasResolver {
    runtime: Arc<dyn Runtime>,
    cache: Arc<ConfigCache>,
}

impl AliasResolver {
    /// Create a resolver with its own empty cache.
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self::with_cache(runtime, Arc::new(ConfigCache::new()))
    }

    /// Create a resolver over the real filesystem and environment.
    pub fn native() -> Self {
        Self::new(Arc::new(NativeRuntime::new()))
    }

    /// Create a resolver that shares `cache` with other resolvers.
    pub fn with_cache(runtime: Arc<dyn Runtime>, cache: Arc<ConfigCache>) -> Self {
        Self { runtime, cache }
    }

    pub fn runtime(&self) -> &dyn Runtime {
        self.runtime.as_ref()
    }

    pub fn cache(&self) -> &Arc<ConfigCache> {
        &self.cache
    }

    /// Resolve `specifier` as imported from `filename`.
    ///
    /// Returns `Ok(None)` when the specifier should be left unchanged: no
    /// config was found, the config is the requesting file itself, the config
    /// is empty, or no alias matches. `Ok(Some(_))` is the full replacement.
    ///
    /// # Errors
    ///
    /// - [`AliasError::ConfigNotFound`] if no config exists and
    ///   `options.require_config` is set
    /// - [`AliasError::Template`] if a config candidate names an unset
    ///   environment variable
    /// - [`AliasError::Config`] if the located config cannot be read or parsed; the
    ///   same error is returned for every later request against that config
    pub fn resolve(
        &self,
        filename: &Path,
        specifier: &str,
        options: &ResolveOptions,
    ) -> Result<Option<String>> {
        let candidates = options.config_candidates();
        let locator = ConfigLocator::new(self.runtime.as_ref());

        let Some(config_path) = locator.locate(filename, &candidates, options.find_config)? else {
            if options.require_config {
                return Err(AliasError::ConfigNotFound {
                    candidates: candidates.iter().map(|c| c.to_string()).collect(),
                });
            }
            return Ok(None);
        };

        let cwd = self.runtime.get_cwd()?;
        let requesting = paths::resolve_from(&cwd, &[filename.to_string_lossy()]);
        if requesting == config_path {
            tracing::trace!("Skipping alias config resolving itself: {}", config_path.display());
            return Ok(None);
        }

        let descriptor = ConfigDescriptor::new(&config_path);
        let entry = self
            .cache
            .get_or_load(&descriptor.path, || build_table(&descriptor, self.runtime.as_ref()));

        let table = match entry {
            CacheEntry::Empty => return Ok(None),
            CacheEntry::Failed(err) => return Err(err.into()),
            CacheEntry::Ready(table) => table,
        };

        let Some(rule) = find_match(&table, specifier) else {
            return Ok(None);
        };

        let ctx = RewriteContext {
            filename: &requesting,
            config_dir: &descriptor.dir,
            extensions: table.extensions(),
            no_output_extension: options.no_output_extension,
        };
        Ok(Some(rewrite_specifier(&ctx, specifier, rule, self.runtime.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::runtime::test_utils::MemoryRuntime;

    fn resolver(runtime: MemoryRuntime) -> (AliasResolver, Arc<MemoryRuntime>) {
        let runtime = Arc::new(runtime);
        (AliasResolver::new(runtime.clone()), runtime)
    }

    fn webpack_resolver() -> (AliasResolver, Arc<MemoryRuntime>) {
        resolver(MemoryRuntime::new("/proj").with_file("/proj/webpack.config.js", WEBPACK))
    }

    fn resolve(resolver: &AliasResolver, file: &str, specifier: &str) -> Result<Option<String>> {
        resolver.resolve(Path::new(file), specifier, &ResolveOptions::default())
    }

    const WEBPACK: &str = r#"
        const path = require('path');
        module.exports = {
            resolve: {
                alias: {
                    '@': path.resolve(__dirname, 'src'),
                    '@lib': 'lodash-x',
                    'vue$': 'vue/dist/vue.esm.js',
                },
                extensions: ['.ts', '.js'],
            },
        };
    "#;

    #[test]
    fn missing_config_is_no_match_by_default() {
        let (resolver, _) = resolver(MemoryRuntime::new("/proj"));
        assert_eq!(resolve(&resolver, "/proj/src/a.js", "@/x").unwrap(), None);
    }

    #[test]
    fn missing_config_is_an_error_when_required() {
        let (resolver, _) = resolver(MemoryRuntime::new("/proj"));
        let options = ResolveOptions::new().config_path("custom.js").require_config(true);

        let err = resolver
            .resolve(Path::new("/proj/src/a.js"), "@/x", &options)
            .unwrap_err();
        let AliasError::ConfigNotFound { candidates } = err else {
            panic!("expected ConfigNotFound, got {err:?}");
        };
        assert_eq!(candidates[0], "custom.js");
        assert_eq!(candidates.len(), 7);
    }

    #[test]
    fn module_style_substitution() {
        let (resolver, _) = webpack_resolver();
        assert_eq!(
            resolve(&resolver, "/proj/src/a.js", "@lib/merge").unwrap().as_deref(),
            Some("lodash-x/merge")
        );
    }

    #[test]
    fn no_match_is_idempotent() {
        let (resolver, _) = webpack_resolver();
        for _ in 0..3 {
            assert_eq!(resolve(&resolver, "/proj/src/a.js", "react").unwrap(), None);
            assert_eq!(resolve(&resolver, "/proj/src/a.js", "@library").unwrap(), None);
            assert_eq!(resolve(&resolver, "/proj/src/a.js", "./local").unwrap(), None);
        }
    }

    #[test]
    fn same_directory_self_reference() {
        let (resolver, _) = webpack_resolver();
        assert_eq!(resolve(&resolver, "/proj/src/index.js", "@").unwrap().as_deref(), Some("./"));
    }

    #[test]
    fn child_rewrite_with_extension_probe() {
        let runtime = MemoryRuntime::new("/proj")
            .with_file("/proj/webpack.config.js", WEBPACK)
            .with_file("/proj/src/Btn.ts", "")
            .with_file("/proj/src/Btn.js", "");
        let (resolver, _) = resolver(runtime);

        assert_eq!(
            resolve(&resolver, "/proj/src/app/index.js", "@/components/Btn").unwrap().as_deref(),
            Some("../components/Btn.ts")
        );

        let options = ResolveOptions::new().no_output_extension(true);
        assert_eq!(
            resolver
                .resolve(Path::new("/proj/src/app/index.js"), "@/components/Btn", &options)
                .unwrap()
                .as_deref(),
            Some("../components/Btn")
        );
    }

    #[test]
    fn exact_key_only_matches_equality() {
        let (resolver, _) = webpack_resolver();
        assert_eq!(
            resolve(&resolver, "/proj/src/a.js", "vue").unwrap().as_deref(),
            Some("vue/dist/vue.esm.js")
        );
        assert_eq!(resolve(&resolver, "/proj/src/a.js", "vue/router").unwrap(), None);
    }

    #[test]
    fn first_declared_rule_wins() {
        let config = r#"
            module.exports = { alias: { '@app': './app', '@app/utils': './shared/utils' } };
        "#;
        let (resolver, _) =
            resolver(MemoryRuntime::new("/proj").with_file("/proj/alias.config.js", config));
        assert_eq!(
            resolve(&resolver, "/proj/index.js", "@app/utils/date").unwrap().as_deref(),
            Some("./app/utils/date")
        );
    }

    #[test]
    fn config_is_loaded_once() {
        let (resolver, runtime) =
            resolver(MemoryRuntime::new("/proj").with_file("/proj/webpack.config.js", WEBPACK));

        let first = resolve(&resolver, "/proj/src/a.js", "@/x").unwrap();
        let second = resolve(&resolver, "/proj/src/a.js", "@/x").unwrap();
        resolve(&resolver, "/proj/src/b.js", "@lib").unwrap();

        assert_eq!(first, second);
        assert_eq!(runtime.read_count("/proj/webpack.config.js"), 1);
    }

    #[test]
    fn shared_cache_across_resolvers() {
        let runtime =
            Arc::new(MemoryRuntime::new("/proj").with_file("/proj/webpack.config.js", WEBPACK));
        let cache = Arc::new(ConfigCache::new());
        let a = AliasResolver::with_cache(runtime.clone(), cache.clone());
        let b = AliasResolver::with_cache(runtime.clone(), cache);

        resolve(&a, "/proj/src/a.js", "@/x").unwrap();
        resolve(&b, "/proj/src/b.js", "@/y").unwrap();
        assert_eq!(runtime.read_count("/proj/webpack.config.js"), 1);

        let (fresh, _) = resolver(MemoryRuntime::new("/proj"));
        assert!(fresh.cache().is_empty());
    }

    #[test]
    fn empty_config_is_silent_and_cached() {
        let (resolver, runtime) = resolver(
            MemoryRuntime::new("/proj").with_file("/proj/alias.config.js", "module.exports = {};"),
        );

        for specifier in ["@", "@/x", "anything"] {
            assert_eq!(resolve(&resolver, "/proj/a.js", specifier).unwrap(), None);
        }
        assert_eq!(runtime.read_count("/proj/alias.config.js"), 1);
    }

    #[test]
    fn failures_are_cached_and_reraised() {
        let (resolver, runtime) = resolver(
            MemoryRuntime::new("/proj")
                .with_file("/proj/webpack.config.js", "module.exports = { alias: "),
        );

        for _ in 0..2 {
            let err = resolve(&resolver, "/proj/a.js", "@/x").unwrap_err();
            assert!(matches!(err, AliasError::Config(ConfigError::Script { .. })));
        }
        assert_eq!(runtime.read_count("/proj/webpack.config.js"), 1);
    }

    #[test]
    fn later_tsconfig_key_overrides_an_equivalent_earlier_one() {
        let tsconfig = r#"{ "compilerOptions": { "paths": { "@/*": ["src"], "@": ["lib"] } } }"#;
        let (resolver, _) =
            resolver(MemoryRuntime::new("/proj").with_file("/proj/tsconfig.json", tsconfig));

        assert_eq!(resolve(&resolver, "/proj/a.js", "@").unwrap().as_deref(), Some("./lib"));
        assert_eq!(resolve(&resolver, "/proj/a.js", "@/x").unwrap(), None);
    }

    #[test]
    fn configs_without_alias_data_never_match() {
        let webpack = "/proj/webpack.config.js";
        let configs = [
            (webpack, "module.exports = (env) => ({ alias: { react: './r' } });"),
            (webpack, "module.exports = 42;"),
            (webpack, "module.exports = merge(base, { alias: { react: './r' } });"),
            ("/proj/tsconfig.json", r#"[{ "compilerOptions": {} }]"#),
        ];

        for (path, source) in configs {
            let (resolver, runtime) = resolver(MemoryRuntime::new("/proj").with_file(path, source));
            for specifier in ["react", "@/x"] {
                assert_eq!(resolve(&resolver, "/proj/a.js", specifier).unwrap(), None);
            }
            assert_eq!(runtime.read_count(path), 1);
        }
    }

    #[test]
    fn config_never_resolves_itself() {
        let config = "module.exports = { alias: { '@': './src' } };";
        let (resolver, _) =
            resolver(MemoryRuntime::new("/proj").with_file("/proj/alias.config.js", config));

        assert_eq!(resolve(&resolver, "/proj/alias.config.js", "@/x").unwrap(), None);
        assert_eq!(resolve(&resolver, "alias.config.js", "@/x").unwrap(), None);
        assert!(resolve(&resolver, "/proj/src/a.js", "@/x").unwrap().is_some());
    }

    #[test]
    fn explicit_config_takes_precedence() {
        let tsconfig = r#"{ "compilerOptions": { "paths": { "@/*": ["src/*"] } } }"#;
        let explicit = "module.exports = { alias: { '@': 'from-explicit' } };";
        let runtime = MemoryRuntime::new("/proj")
            .with_file("/proj/tsconfig.json", tsconfig)
            .with_file("/proj/config/aliases.js", explicit);
        let (resolver, _) = resolver(runtime);

        let options = ResolveOptions::new().config_path("config/aliases.js");
        assert_eq!(
            resolver.resolve(Path::new("/proj/a.js"), "@/x", &options).unwrap().as_deref(),
            Some("from-explicit/x")
        );
        assert_eq!(
            resolve(&resolver, "/proj/lib/a.js", "@/x").unwrap().as_deref(),
            Some("../src/x")
        );
    }

    #[test]
    fn upward_search_uses_nearest_project_config() {
        let runtime = MemoryRuntime::new("/")
            .with_file(
                "/repo/web/tsconfig.json",
                r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "~/*": ["src/*"] } } }"#,
            );
        let (resolver, _) = resolver(runtime);
        let options = ResolveOptions::new().find_config(true);

        assert_eq!(
            resolver
                .resolve(Path::new("/repo/web/src/pages/home.tsx"), "~/ui/Card", &options)
                .unwrap()
                .as_deref(),
            Some("../ui/Card")
        );
        assert_eq!(
            resolver.resolve(Path::new("/other/a.ts"), "~/x", &options).unwrap(),
            None
        );
    }
}
