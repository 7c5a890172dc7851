//! End-to-end runs of the full axis pipeline.

use varforge_lib::config::ArchTarget;
use varforge_lib::config::Bitness;
use varforge_lib::consts::{AXIS_APEX, AXIS_IMAGE, AXIS_SANITIZE, PROP_PARTITION, PROP_UNIT};
use varforge_lib::error::{ErrorCategory, ResolveError};
use varforge_lib::module::{DepDecl, DepKind, ModuleKind};
use varforge_lib::util::hash::Hashable;
use varforge_lib::{BuildConfig, EngineError, ModuleDecl};

use super::common::{count_with_label, modules, plan, record, resolve, single_arch, with_unit};

fn chain() -> Vec<ModuleDecl> {
  vec![
    ModuleDecl::binary("app").static_dep("libfoo"),
    ModuleDecl::library("libfoo").static_dep("libbar"),
    ModuleDecl::library("libbar"),
  ]
}

#[test]
fn root_links_chain_in_order() {
  let res = resolve(chain(), single_arch());
  res.ensure_success().unwrap();

  let app = plan(&res, "app[arch=arm64]");
  assert_eq!(modules(&app.link_order), vec!["libfoo", "libbar"]);
  assert_eq!(modules(&app.link_inputs.static_libs), vec!["libfoo"]);

  let foo = plan(&res, "libfoo[arch=arm64,link=static]");
  assert_eq!(modules(&foo.link_order), vec!["libfoo", "libbar"]);
}

#[test]
fn every_arch_gets_its_own_variants() {
  let res = resolve(chain(), BuildConfig::default());
  res.ensure_success().unwrap();

  assert_eq!(res.manifest.variants_of("libfoo").count(), 4);
  assert_eq!(res.manifest.variants_of("app").count(), 2);

  let arm = plan(&res, "app[arch=arm]");
  assert!(
    arm
      .link_order
      .iter()
      .all(|a| a.0.contains("/arm_static/")),
    "{:?}",
    arm.link_order
  );
}

#[test]
fn multilib_first_builds_only_primary_arch() {
  let mut lib = ModuleDecl::library("libfoo");
  lib.multilib = varforge_lib::module::Multilib::First;
  let res = resolve(vec![lib], BuildConfig::default());
  assert_eq!(res.manifest.variants_of("libfoo").count(), 2);
  record(&res, "libfoo[arch=arm64,link=shared]");
}

#[test]
fn dependency_on_disabled_arch_is_reported() {
  let mut libbar = ModuleDecl::library("libbar");
  libbar.disabled_archs = vec!["arm".to_string()];
  let res = resolve(
    vec![ModuleDecl::binary("app").static_dep("libbar"), libbar],
    BuildConfig::default(),
  );

  assert_eq!(res.diagnostics.count(ErrorCategory::GraphConsistency), 1);
  let diag = &res.diagnostics.errors[0];
  assert_eq!(diag.variant.as_deref(), Some("app[arch=arm]"));
  assert!(matches!(diag.error, ResolveError::DisabledDependency { .. }));

  assert!(record(&res, "app[arch=arm]").plan.is_none());
  assert!(record(&res, "app[arch=arm64]").plan.is_some());
  assert!(!res.manifest.variants.contains_key("libbar[arch=arm,link=static]"));
}

#[test]
fn disabled_module_cannot_be_depended_on() {
  let mut libbar = ModuleDecl::library("libbar");
  libbar.enabled = false;
  let res = resolve(vec![ModuleDecl::binary("app").shared_dep("libbar"), libbar], single_arch());
  assert!(matches!(
    res.ensure_success(),
    Err(EngineError::Failed { count: 1, .. })
  ));
}

#[test]
fn undefined_dependency_fails_the_run() {
  let res = resolve(vec![ModuleDecl::binary("app").shared_dep("libgone")], single_arch());
  assert_eq!(res.diagnostics.count(ErrorCategory::MissingDependency), 1);
  let err = res.ensure_success().unwrap_err();
  assert!(err.to_string().contains("libgone"));
}

#[test]
fn undefined_dependency_is_tolerated_when_allowed() {
  let config = BuildConfig {
    allow_missing_dependencies: true,
    ..single_arch()
  };
  let res = resolve(
    vec![ModuleDecl::binary("app").shared_dep("libgone").static_dep("libfoo"), ModuleDecl::library("libfoo")],
    config,
  );

  res.ensure_success().unwrap();
  assert!(res.manifest.missing_dependencies.contains("libgone"));
  let app = plan(&res, "app[arch=arm64]");
  assert!(app.link_inputs.shared_libs.is_empty());
  assert_eq!(modules(&app.link_inputs.static_libs), vec!["libfoo"]);
}

#[test]
fn static_dependency_on_binary_is_a_declaration_error() {
  let res = resolve(
    vec![ModuleDecl::binary("app").static_dep("tool"), ModuleDecl::binary("tool")],
    single_arch(),
  );

  assert_eq!(res.diagnostics.count(ErrorCategory::Configuration), 1);
  assert_eq!(res.diagnostics.count(ErrorCategory::GraphConsistency), 0);
  assert_eq!(res.diagnostics.errors[0].module, "app");
  assert!(plan(&res, "app[arch=arm64]").link_inputs.static_libs.is_empty());
}

#[test]
fn static_dependency_on_shared_only_library_is_a_declaration_error() {
  let res = resolve(
    vec![
      ModuleDecl::binary("app").static_dep("libdyn").static_dep("libfoo"),
      ModuleDecl::library("libdyn").shared_only(),
      ModuleDecl::library("libfoo"),
    ],
    single_arch(),
  );

  assert_eq!(res.diagnostics.count(ErrorCategory::Configuration), 1);
  assert_eq!(res.diagnostics.count(ErrorCategory::GraphConsistency), 0);
  assert!(res.diagnostics.errors[0].error.to_string().contains("libdyn"));
  assert_eq!(modules(&plan(&res, "app[arch=arm64]").link_inputs.static_libs), vec!["libfoo"]);
}

#[test]
fn static_cycle_fails_members_and_consumers() {
  let res = resolve(
    vec![
      ModuleDecl::binary("app").static_dep("liba"),
      ModuleDecl::library("liba").static_dep("libb"),
      ModuleDecl::library("libb").static_dep("liba"),
    ],
    single_arch(),
  );

  let cycles: Vec<_> = res
    .diagnostics
    .errors
    .iter()
    .filter(|d| matches!(d.error, ResolveError::DependencyCycle { .. }))
    .collect();
  assert_eq!(cycles.len(), 2);

  let app_failure = res
    .diagnostics
    .errors
    .iter()
    .find(|d| d.module == "app")
    .unwrap();
  assert!(matches!(app_failure.error, ResolveError::DependencyFailed { .. }));
  assert!(record(&res, "app[arch=arm64]").plan.is_none());
}

#[test]
fn sanitized_binary_pulls_sanitized_libraries() {
  let mut app = ModuleDecl::binary("app").static_dep("libfoo");
  app.sanitize.requested = Some("address".to_string());
  let config = BuildConfig {
    sanitizers: vec!["address".to_string()],
    ..single_arch()
  };
  let res = resolve(vec![app, ModuleDecl::library("libfoo")], config);
  res.ensure_success().unwrap();

  let app = plan(&res, "app[arch=arm64,sanitize=address]");
  assert!(app.cflags.contains(&"-fsanitize=address".to_string()));
  assert_eq!(app.link_inputs.static_libs[0].0, "libfoo/arm64_static_address/libfoo.a");

  let lib = record(&res, "libfoo[arch=arm64,link=static,sanitize=address]");
  assert!(lib.hidden);
  assert!(!lib.installable);
  assert_eq!(count_with_label(&res, "libfoo", AXIS_SANITIZE, ""), 2);
}

#[test]
fn vendor_available_library_gets_vendor_variants() {
  let mut lib = ModuleDecl::library("libfoo");
  lib.image.vendor_available = true;
  let mut vendor_bin = ModuleDecl::binary("vendor_tool").shared_dep("libfoo");
  vendor_bin.image.partition = varforge_lib::module::Partition::Vendor;

  let res = resolve(vec![lib, vendor_bin], single_arch());
  res.ensure_success().unwrap();

  assert_eq!(count_with_label(&res, "libfoo", AXIS_IMAGE, "vendor"), 2);
  let vendor = record(&res, "libfoo[arch=arm64,image=vendor,link=shared]");
  assert_eq!(vendor.properties[AXIS_IMAGE][PROP_PARTITION], "vendor");

  let tool = plan(&res, "vendor_tool[arch=arm64,image=vendor]");
  assert_eq!(
    tool.link_inputs.shared_libs[0].variant,
    "libfoo[arch=arm64,image=vendor,link=shared]"
  );
}

#[test]
fn unit_members_get_hidden_unit_variants() {
  let config = with_unit(single_arch(), "com.example.media", &["libmedia"]);
  let res = resolve(vec![ModuleDecl::library("libmedia")], config);
  res.ensure_success().unwrap();

  assert_eq!(res.manifest.variants_of("libmedia").count(), 4);
  let unit = record(&res, "libmedia[apex=apex:com.example.media,arch=arm64,link=shared]");
  assert!(unit.hidden);
  assert_eq!(unit.properties[AXIS_APEX][PROP_UNIT], "com.example.media");
  assert!(!record(&res, "libmedia[arch=arm64,link=shared]").hidden);
}

#[test]
fn apex_only_module_has_no_platform_variant() {
  let mut lib = ModuleDecl::library("libmedia");
  lib.apex_only = true;
  let config = with_unit(single_arch(), "com.example.media", &["libmedia"]);
  let res = resolve(vec![lib], config);
  res.ensure_success().unwrap();
  assert_eq!(count_with_label(&res, "libmedia", AXIS_APEX, ""), 0);
  assert_eq!(res.manifest.variants_of("libmedia").count(), 2);
}

#[test]
fn unit_variant_links_unit_variant_of_member_dependency() {
  let config = with_unit(single_arch(), "com.example.media", &["libmedia", "libcodec"]);
  let res = resolve(
    vec![ModuleDecl::library("libmedia").static_dep("libcodec"), ModuleDecl::library("libcodec")],
    config,
  );
  res.ensure_success().unwrap();

  let unit = plan(&res, "libmedia[apex=apex:com.example.media,arch=arm64,link=shared]");
  assert_eq!(
    unit.link_inputs.static_libs[0].0,
    "libcodec/apex:com.example.media_arm64_static/libcodec.a"
  );
}

#[test]
fn header_exports_reach_consumers() {
  let mut headers = ModuleDecl::new("libhdr", ModuleKind::Headers);
  headers.export.include_dirs = vec!["hdr/include".to_string()];
  let mut reexport = DepDecl::new("libhdr", DepKind::Header);
  reexport.reexport = true;
  let mut libfoo = ModuleDecl::library("libfoo");
  libfoo.deps.push(reexport);
  libfoo.export.include_dirs = vec!["foo/include".to_string()];

  let res = resolve(
    vec![ModuleDecl::binary("app").shared_dep("libfoo"), libfoo, headers],
    single_arch(),
  );
  res.ensure_success().unwrap();

  let foo = plan(&res, "libfoo[arch=arm64,link=shared]");
  assert_eq!(foo.link_inputs.exported.include_dirs, vec!["hdr/include"]);
  assert_eq!(foo.exports.include_dirs, vec!["foo/include", "hdr/include"]);

  let app = plan(&res, "app[arch=arm64]");
  assert_eq!(
    app.link_inputs.exported.include_dirs,
    vec!["foo/include", "hdr/include"]
  );
}

#[test]
fn whole_static_libraries_are_listed_separately() {
  let res = resolve(
    vec![
      ModuleDecl::binary("app").whole_static_dep("libwhole").static_dep("libfoo"),
      ModuleDecl::library("libwhole"),
      ModuleDecl::library("libfoo"),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();

  let app = plan(&res, "app[arch=arm64]");
  assert_eq!(modules(&app.link_inputs.whole_static_libs), vec!["libwhole"]);
  assert_eq!(modules(&app.link_inputs.static_libs), vec!["libfoo"]);
}

#[test]
fn objects_and_crt_are_collected() {
  let res = resolve(
    vec![
      ModuleDecl::binary("app")
        .dep("crtbegin", DepKind::CrtBegin)
        .dep("crtend", DepKind::CrtEnd)
        .dep("init_obj", DepKind::Object),
      ModuleDecl::new("crtbegin", ModuleKind::Crt),
      ModuleDecl::new("crtend", ModuleKind::Crt),
      ModuleDecl::new("init_obj", ModuleKind::Object),
    ],
    single_arch(),
  );
  res.ensure_success().unwrap();

  let app = plan(&res, "app[arch=arm64]");
  assert_eq!(app.link_inputs.crt_begin[0].0, "crtbegin/arm64/crtbegin.o");
  assert_eq!(modules(&app.link_inputs.crt_end), vec!["crtend"]);
  assert_eq!(modules(&app.link_inputs.objects), vec!["init_obj"]);
}

#[test]
fn manifest_hash_is_stable_across_runs() {
  let config = BuildConfig {
    targets: vec![
      ArchTarget::new("x86_64", Bitness::Lib64),
      ArchTarget::new("x86", Bitness::Lib32),
    ],
    sanitizers: vec!["address".to_string()],
    ..BuildConfig::default()
  };
  let first = resolve(chain(), config.clone());
  let second = resolve(chain(), config);
  assert_eq!(first.manifest, second.manifest);
  assert_eq!(
    first.manifest.compute_hash().unwrap(),
    second.manifest.compute_hash().unwrap()
  );
}

#[test]
fn configuration_errors_do_not_stop_other_modules() {
  let mut broken = ModuleDecl::library("libbroken");
  broken.static_enabled = false;
  broken.shared_enabled = false;
  let res = resolve(chain().into_iter().chain([broken]).collect(), single_arch());

  assert_eq!(res.diagnostics.count(ErrorCategory::Configuration), 1);
  assert_eq!(plan(&res, "app[arch=arm64]").link_order.len(), 2);
}
