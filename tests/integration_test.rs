use bundlr::driver::Driver;
use bundlr::types::BundlerConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
  let path = root.join(rel);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn dev_config(root: &Path, entry: &str) -> BundlerConfig {
  BundlerConfig {
    project_root: root.to_path_buf(),
    web_root: root.to_path_buf(),
    output_folder: PathBuf::from("build"),
    source_root: PathBuf::from("src"),
    entry_points: vec![PathBuf::from(entry)],
    asset_files: Vec::new(),
    include_paths: Vec::new(),
    cache_dir: root.join(".bundlr-cache"),
    is_dev: true,
    external_packages_dir: "node_modules".to_string(),
    resolve_extensions: vec![
      "ts".to_string(),
      "js".to_string(),
      "json".to_string(),
      "node".to_string(),
    ],
  }
}

/// S1: named, namespace, aliased and require-style imports in one file all
/// end up concatenated into the entry bundle, ES imports first.
#[test]
fn entry_with_mixed_import_styles_concatenates_all_dependencies() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/Import.ts", "export const a = 1;");
  write(tmp.path(), "src/All.ts", "export const b = 2;");
  write(tmp.path(), "src/Alias.ts", "export const c = 3;");
  write(tmp.path(), "src/module.js", "module.exports = 4;");
  write(
    tmp.path(),
    "src/main.ts",
    r#"import { a } from "./Import";
import * as All from "./All";
import { c as renamed } from "./Alias";
const mod = require("./module.js");
"#,
  );

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();

  let bundle = fs::read_to_string(tmp.path().join("build/main.js")).unwrap();
  assert!(bundle.contains("export const a = 1;"));
  assert!(bundle.contains("export const b = 2;"));
  assert!(bundle.contains("export const c = 3;"));
  assert!(bundle.contains("module.exports = 4;"));

  let import_pos = bundle.find("export const a = 1;").unwrap();
  let module_pos = bundle.find("module.exports = 4;").unwrap();
  assert!(import_pos < module_pos, "ES imports should precede require-style ones");
}

/// S3: a diamond-shaped import graph is deduplicated and every dependency
/// precedes its first importer.
#[test]
fn diamond_dependency_graph_is_deduplicated() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/shared.ts", "export const shared = true;");
  write(tmp.path(), "src/a.ts", r#"import "./shared";"#);
  write(tmp.path(), "src/b.ts", r#"import "./shared";"#);
  write(tmp.path(), "src/main.ts", r#"import "./a"; import "./b";"#);

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();

  let bundle = fs::read_to_string(tmp.path().join("build/main.js")).unwrap();
  let occurrences = bundle.matches("export const shared = true;").count();
  assert_eq!(occurrences, 1, "shared dependency must appear exactly once");
}

/// S4: a TypeScript entry peeks to the same terminal extension it's actually
/// transpiled to.
#[test]
fn typescript_entry_is_stripped_to_javascript() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/main.ts", "const x: number = 1;\nconsole.log(x);");

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();

  let bundle = fs::read_to_string(tmp.path().join("build/main.js")).unwrap();
  assert!(!bundle.contains(": number"));
  assert!(bundle.contains("console.log(x);"));
}

/// S5: an unresolvable import is silently dropped rather than failing the
/// whole build.
#[test]
fn unresolvable_import_does_not_fail_the_build() {
  let tmp = TempDir::new().unwrap();
  write(
    tmp.path(),
    "src/main.ts",
    r#"import "./does-not-exist"; console.log("ok");"#,
  );

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  let summary = driver.build().unwrap();

  assert!(summary.rebuilt.contains(&"main.js".to_string()));
  let bundle = fs::read_to_string(tmp.path().join("build/main.js")).unwrap();
  assert!(bundle.contains(r#"console.log("ok");"#));
}

/// A CSS entry's url()-referenced image is emitted as its own standalone
/// asset rather than concatenated into the script bundle.
#[test]
fn css_url_reference_becomes_a_standalone_asset() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/logo.png", "binary-ish-content");
  write(
    tmp.path(),
    "src/app.css",
    r#".logo { background: url("./logo.png"); }"#,
  );
  write(tmp.path(), "src/main.ts", r#"import "./app.css";"#);

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();

  let asset = fs::read_to_string(tmp.path().join("build/logo.png")).unwrap();
  assert_eq!(asset, "binary-ish-content", "asset content must be written raw, not wrapped");
}

/// Vendor (node_modules) dependencies land in a separate `<entry>.vendor.js`
/// target rather than the main bundle.
#[test]
fn node_modules_dependency_is_split_into_vendor_bundle() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/main.ts", r#"import "left-pad";"#);
  write(tmp.path(), "node_modules/left-pad/index.js", "module.exports = 1;");
  write(
    tmp.path(),
    "node_modules/left-pad/package.json",
    r#"{"main": "index.js"}"#,
  );

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();

  let bundle = fs::read_to_string(tmp.path().join("build/main.js")).unwrap();
  assert!(!bundle.contains("module.exports = 1;"));
  let vendor = fs::read_to_string(tmp.path().join("build/main.vendor.js")).unwrap();
  assert!(vendor.contains("module.exports = 1;"));
}

/// A second build with no source changes rebuilds nothing.
#[test]
fn unchanged_sources_produce_a_fully_fresh_second_build() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/main.ts", "console.log(1);");

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();
  let second = driver.build().unwrap();

  assert!(second.rebuilt.is_empty());
  assert!(second.fresh.contains(&"main.js".to_string()));
}

/// Touching a dependency invalidates only the entry that depends on it.
#[test]
fn touching_a_dependency_invalidates_the_bundle() {
  let tmp = TempDir::new().unwrap();
  write(tmp.path(), "src/util.ts", "export const v = 1;");
  write(tmp.path(), "src/main.ts", r#"import "./util";"#);

  let driver = Driver::new(dev_config(tmp.path(), "src/main.ts"));
  driver.build().unwrap();

  std::thread::sleep(std::time::Duration::from_millis(20));
  write(tmp.path(), "src/util.ts", "export const v = 2;");

  let summary = driver.build().unwrap();
  assert!(summary.rebuilt.contains(&"main.js".to_string()));
  let bundle = fs::read_to_string(tmp.path().join("build/main.js")).unwrap();
  assert!(bundle.contains("export const v = 2;"));
}
