//! Link type, API level and double-load checks.

use varforge_lib::error::{ErrorCategory, ResolveError};
use varforge_lib::ModuleDecl;

use super::common::{plan, resolve, single_arch, with_unit};

fn with_stl(decl: ModuleDecl, stl: &str) -> ModuleDecl {
  ModuleDecl {
    stl: Some(stl.to_string()),
    ..decl
  }
}

fn with_sdk(decl: ModuleDecl, sdk: &str) -> ModuleDecl {
  ModuleDecl {
    sdk_version: Some(sdk.to_string()),
    ..decl
  }
}

#[test]
fn incompatible_stl_is_a_link_type_error() {
  let res = resolve(
    vec![
      with_stl(ModuleDecl::binary("app").static_dep("libfoo"), "libc++"),
      with_stl(ModuleDecl::library("libfoo"), "libstdc++"),
    ],
    single_arch(),
  );
  assert_eq!(res.diagnostics.count(ErrorCategory::LinkType), 1);
}

#[test]
fn libcxx_flavours_are_compatible() {
  let res = resolve(
    vec![
      with_stl(ModuleDecl::binary("app").static_dep("libfoo").static_dep("libsys"), "libc++_static"),
      with_stl(ModuleDecl::library("libfoo"), "libc++"),
      with_stl(ModuleDecl::library("libsys"), "system"),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();
}

#[test]
fn every_violation_is_reported() {
  let res = resolve(
    vec![
      with_stl(ModuleDecl::binary("app1").static_dep("libfoo"), "libc++"),
      with_stl(ModuleDecl::binary("app2").static_dep("libfoo"), "libc++"),
      with_stl(ModuleDecl::library("libfoo"), "libstdc++"),
    ],
    single_arch(),
  );
  let modules: Vec<&str> = res
    .diagnostics
    .by_category(ErrorCategory::LinkType)
    .map(|d| d.module.as_str())
    .collect();
  assert_eq!(modules, vec!["app1", "app2"]);
}

#[test]
fn sdk_module_cannot_link_newer_library() {
  let res = resolve(
    vec![
      with_sdk(ModuleDecl::binary("app").shared_dep("libfoo"), "29"),
      with_sdk(ModuleDecl::library("libfoo"), "31"),
    ],
    single_arch(),
  );
  assert_eq!(res.diagnostics.count(ErrorCategory::LinkType), 1);
}

#[test]
fn sdk_module_cannot_link_platform_library() {
  let res = resolve(
    vec![
      with_sdk(ModuleDecl::binary("app").shared_dep("libfoo"), "29"),
      ModuleDecl::library("libfoo"),
    ],
    single_arch(),
  );
  assert_eq!(res.diagnostics.count(ErrorCategory::LinkType), 1);
}

#[test]
fn sdk_module_may_link_pinned_stub() {
  let res = resolve(
    vec![
      with_sdk(ModuleDecl::binary("app").shared_dep("libfoo@29"), "29"),
      ModuleDecl::library("libfoo").with_stubs(&["29"]),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();
}

#[test]
fn sdk_module_may_link_stub_chosen_across_boundary() {
  let decls = || {
    vec![
      with_sdk(ModuleDecl::binary("app").shared_dep("libfoo"), "29"),
      ModuleDecl::library("libfoo").with_stubs(&["29"]),
    ]
  };

  let res = resolve(decls(), with_unit(single_arch(), "com.example.foo", &["libfoo"]));
  res.ensure_success().unwrap();
  let selection = &plan(&res, "app[arch=arm64]").link_inputs.shared_libs[0];
  assert!(selection.stub_version.is_some());

  // Without a boundary the implementation is linked and judged.
  let res = resolve(decls(), single_arch());
  assert_eq!(res.diagnostics.count(ErrorCategory::LinkType), 1);
}

#[test]
fn current_sdk_links_anything() {
  let res = resolve(
    vec![
      with_sdk(ModuleDecl::binary("app").shared_dep("libfoo").static_dep("libbar"), "current"),
      ModuleDecl::library("libfoo"),
      with_sdk(ModuleDecl::library("libbar"), "current"),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();
}

fn stable(name: &str) -> ModuleDecl {
  let mut decl = ModuleDecl::library(name).with_stubs(&["30"]);
  decl.stable_interface = true;
  decl
}

fn vendor_available(name: &str, double_loadable: bool) -> ModuleDecl {
  let mut decl = ModuleDecl::library(name);
  decl.image.vendor_available = true;
  decl.double_loadable = double_loadable;
  decl
}

#[test]
fn double_load_violation_reports_path() {
  let res = resolve(
    vec![
      stable("libstable").shared_dep("libmid"),
      ModuleDecl::library("libmid").shared_dep("libvendor"),
      vendor_available("libvendor", false),
    ],
    single_arch(),
  );

  let violations: Vec<_> = res.diagnostics.by_category(ErrorCategory::DoubleLoad).collect();
  assert_eq!(violations.len(), 1);
  assert_eq!(violations[0].module, "libstable");
  match &violations[0].error {
    ResolveError::DoubleLoad { dep, path } => {
      assert_eq!(dep, "libvendor");
      assert_eq!(path, "libstable -> libmid -> libvendor");
    }
    other => panic!("unexpected error {:?}", other),
  }
}

#[test]
fn double_loadable_libraries_are_walked_through() {
  let res = resolve(
    vec![
      stable("libstable").shared_dep("libok"),
      vendor_available("libok", true).shared_dep("libbad"),
      vendor_available("libbad", false),
    ],
    single_arch(),
  );
  let violations: Vec<_> = res.diagnostics.by_category(ErrorCategory::DoubleLoad).collect();
  assert_eq!(violations.len(), 1);
  assert!(violations[0].error.to_string().contains("libstable -> libok -> libbad"));
}

#[test]
fn stable_interfaces_stop_the_walk() {
  let mut other = stable("libotherstable").shared_dep("libbad");
  other.image.vendor_available = true;
  let res = resolve(
    vec![
      stable("libstable").shared_dep("libotherstable"),
      other,
      vendor_available("libbad", false),
    ],
    single_arch(),
  );
  // One violation per image variant of libotherstable, none for libstable.
  let modules: Vec<&str> = res
    .diagnostics
    .by_category(ErrorCategory::DoubleLoad)
    .map(|d| d.module.as_str())
    .collect();
  assert_eq!(modules, vec!["libotherstable", "libotherstable"]);
}
