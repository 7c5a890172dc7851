//! Transitive static link ordering.

use varforge_lib::ModuleDecl;

use super::common::{modules, plan, resolve, single_arch};

fn triangle(declare_c_first: bool) -> Vec<ModuleDecl> {
  let a = if declare_c_first {
    ModuleDecl::binary("a").static_dep("libc").static_dep("libb")
  } else {
    ModuleDecl::binary("a").static_dep("libb").static_dep("libc")
  };
  vec![a, ModuleDecl::library("libb").static_dep("libc"), ModuleDecl::library("libc")]
}

#[test]
fn shared_dependency_appears_once_after_its_consumer() {
  for declare_c_first in [false, true] {
    let res = resolve(triangle(declare_c_first), single_arch());
    res.ensure_success().unwrap();

    let a = plan(&res, "a[arch=arm64]");
    assert_eq!(modules(&a.link_order), vec!["libb", "libc"]);
    assert_eq!(modules(&a.link_inputs.static_libs), vec!["libb", "libc"]);
  }
}

#[test]
fn diamond_keeps_every_library_once() {
  let res = resolve(
    vec![
      ModuleDecl::binary("app").static_dep("libleft").static_dep("libright"),
      ModuleDecl::library("libleft").static_dep("libbase"),
      ModuleDecl::library("libright").static_dep("libbase"),
      ModuleDecl::library("libbase"),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();

  let order = modules(&plan(&res, "app[arch=arm64]").link_order);
  assert_eq!(order.len(), 3);
  assert_eq!(order.last(), Some(&"libbase"));
  assert_eq!(order.iter().filter(|m| **m == "libbase").count(), 1);
}

#[test]
fn static_libraries_of_shared_dependencies_are_ordered_after_them() {
  let res = resolve(
    vec![
      ModuleDecl::binary("app").shared_dep("libfoo").static_dep("libutil"),
      ModuleDecl::library("libfoo").static_dep("libutil"),
      ModuleDecl::library("libutil"),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();

  let app = plan(&res, "app[arch=arm64]");
  assert_eq!(modules(&app.link_order), vec!["libutil"]);
  assert_eq!(app.link_inputs.shared_libs[0].module, "libfoo");

  let shared = plan(&res, "libfoo[arch=arm64,link=shared]");
  assert_eq!(modules(&shared.link_order), vec!["libutil"]);
}

#[test]
fn shared_library_link_order_excludes_itself() {
  let res = resolve(vec![ModuleDecl::library("libfoo")], single_arch());
  assert!(plan(&res, "libfoo[arch=arm64,link=shared]").link_order.is_empty());
  assert_eq!(
    modules(&plan(&res, "libfoo[arch=arm64,link=static]").link_order),
    vec!["libfoo"]
  );
}

#[test]
fn consumers_agree_on_unrelated_libraries() {
  let res = resolve(
    vec![
      ModuleDecl::binary("x").static_dep("libb").static_dep("libc"),
      ModuleDecl::binary("y").static_dep("libc").static_dep("libb"),
      ModuleDecl::library("libz").static_dep("libc").static_dep("libb"),
      ModuleDecl::library("libb"),
      ModuleDecl::library("libc"),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();

  let x = plan(&res, "x[arch=arm64]");
  let y = plan(&res, "y[arch=arm64]");
  assert_eq!(modules(&x.link_inputs.static_libs), modules(&y.link_inputs.static_libs));
  assert_eq!(modules(&x.link_order), modules(&y.link_order));
  assert_eq!(
    modules(&plan(&res, "libz[arch=arm64,link=static]").link_order),
    vec!["libz", "libb", "libc"]
  );
}
