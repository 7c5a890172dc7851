//! Generated configurations and graphs.

use std::collections::HashMap;

use proptest::prelude::*;
use varforge_lib::config::{ArchTarget, Bitness, DeploymentUnit};
use varforge_lib::util::hash::Hashable;
use varforge_lib::{BuildConfig, ModuleDecl};

use super::common::{modules, plan, resolve};

fn config(archs: usize, units: usize, sanitizers: usize) -> BuildConfig {
  BuildConfig {
    targets: (0..archs)
      .map(|i| ArchTarget::new(&format!("arch{}", i), Bitness::Lib64))
      .collect(),
    deployment_units: (0..units)
      .map(|i| DeploymentUnit::new(&format!("com.example.unit{}", i), &["libfoo"]))
      .collect(),
    sanitizers: (0..sanitizers).map(|i| format!("san{}", i)).collect(),
    ..BuildConfig::default()
  }
}

/// Lib count, an adjacency matrix (only `i -> j` with `i < j` is used) and
/// the order in which the root declares its dependencies.
fn dag() -> impl Strategy<Value = (usize, Vec<bool>, Vec<usize>)> {
  (2usize..7).prop_flat_map(|n| {
    (
      Just(n),
      proptest::collection::vec(any::<bool>(), n * n),
      Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
    )
  })
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(32))]

  #[test]
  fn variant_count_is_the_axis_product(
    archs in 1usize..4,
    vendor in any::<bool>(),
    units in 0usize..3,
    sanitizers in 0usize..3,
  ) {
    let mut lib = ModuleDecl::library("libfoo");
    lib.image.vendor_available = vendor;
    let config = config(archs, units, sanitizers);

    let first = resolve(vec![lib.clone()], config.clone());
    prop_assert!(first.is_success());

    let images = if vendor { 2 } else { 1 };
    let expected = archs * images * 2 * (1 + units) * (1 + sanitizers);
    prop_assert_eq!(first.manifest.variants_of("libfoo").count(), expected);

    let second = resolve(vec![lib], config);
    prop_assert_eq!(
      first.manifest.compute_hash().unwrap(),
      second.manifest.compute_hash().unwrap()
    );
  }

  #[test]
  fn static_libraries_precede_their_dependencies((n, edges, order) in dag()) {
    let name = |i: usize| format!("lib{}", i);
    let has_edge = |i: usize, j: usize| i < j && edges[i * n + j];

    let mut decls: Vec<ModuleDecl> = order
      .iter()
      .rev()
      .map(|&i| {
        (0..n)
          .filter(|&j| has_edge(i, j))
          .fold(ModuleDecl::library(&name(i)), |decl, j| decl.static_dep(&name(j)))
      })
      .collect();
    decls.push(
      order
        .iter()
        .fold(ModuleDecl::binary("app"), |decl, &i| decl.static_dep(&name(i))),
    );
    decls.push(
      order
        .iter()
        .rev()
        .fold(ModuleDecl::binary("other"), |decl, &i| decl.static_dep(&name(i))),
    );

    let res = resolve(decls, BuildConfig::single_target("arm64"));
    prop_assert!(res.is_success(), "{:?}", res.diagnostics.errors);

    let app = plan(&res, "app[arch=arm64]");
    let linked = modules(&app.link_inputs.static_libs);
    prop_assert_eq!(linked.len(), n);

    let position: HashMap<&str, usize> = linked.iter().enumerate().map(|(p, m)| (*m, p)).collect();
    prop_assert_eq!(position.len(), n);
    for i in 0..n {
      for j in 0..n {
        if has_edge(i, j) {
          prop_assert!(
            position[name(i).as_str()] < position[name(j).as_str()],
            "{} must precede {} in {:?}",
            name(i),
            name(j),
            linked
          );
        }
      }
    }

    // Every consumer sees shared archives in one relative order.
    let other = plan(&res, "other[arch=arm64]");
    prop_assert_eq!(modules(&other.link_inputs.static_libs), linked.clone());
    let full: HashMap<&str, usize> = modules(&app.link_order).into_iter().enumerate().map(|(p, m)| (m, p)).collect();
    for i in 0..n {
      let lib = plan(&res, &format!("{}[arch=arm64,link=static]", name(i)));
      let seen: Vec<usize> = modules(&lib.link_order).iter().map(|m| full[*m]).collect();
      prop_assert!(seen.windows(2).all(|w| w[0] < w[1]), "{} disagrees: {:?}", name(i), seen);
    }
  }
}
