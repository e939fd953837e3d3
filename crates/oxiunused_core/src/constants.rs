//! Constants for file extensions, resolution probing and framework conventions.
//!
//! Discovery accepts every JavaScript/TypeScript flavour, while module
//! resolution only infers the four extensions a bare `./foo` reference can
//! point at.

/// File extensions for JavaScript/TypeScript files that should be analyzed
pub const JS_TS_EXTENSIONS: &[&str] = &[
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "js",  // JavaScript
    "jsx", // JavaScript with JSX
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
];

/// Extensions appended to an extensionless reference (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Index file names to try when a reference points at a directory
pub const INDEX_FILES: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx"];

/// Compiler configuration files looked up at the project root, first hit wins
pub const COMPILER_CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// Directory name that marks vendored dependencies
pub const VENDOR_DIR: &str = "node_modules";

/// Folders skipped during discovery unless the user overrides the list
pub const DEFAULT_EXCLUDED_FOLDERS: &[&str] =
    &["node_modules", ".next", ".git", "dist", "build", "out", "coverage"];

/// HTTP methods a route handler file may export
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"];

/// File stems the App Router renders implicitly through their default export
pub const APP_COMPONENT_FILES: &[&str] =
    &["page", "layout", "template", "loading", "error", "global-error", "not-found", "default"];

/// Non-default exports the framework reads from route tree files
pub const SPECIAL_EXPORT_NAMES: &[&str] = &[
    "generateMetadata",
    "generateStaticParams",
    "generateViewport",
    "generateImageMetadata",
    "generateSitemaps",
    "metadata",
    "viewport",
    "revalidate",
    "dynamic",
    "dynamicParams",
    "fetchCache",
    "preferredRegion",
    "runtime",
    "maxDuration",
    "config",
    // Pages Router data fetching
    "getServerSideProps",
    "getStaticProps",
    "getStaticPaths",
    "getInitialProps",
];

/// Directory name whose files are invoked by framework machinery
pub const ACTIONS_DIR: &str = "actions";
