use crate::consts::{AXIS_IMAGE, IMAGE_CORE, IMAGE_PRODUCT, IMAGE_RAMDISK, IMAGE_RECOVERY, IMAGE_VENDOR, PROP_PARTITION};
use crate::graph::{DepEdge, PassRecord, Variant};
use crate::module::{ImageDecl, Partition};

use super::{Axis, AxisContext, offered_or_first};

/// Install partition.
pub struct ImageAxis;

fn image_labels(image: &ImageDecl) -> Vec<&'static str> {
  let mut labels = match image.partition {
    Partition::System => {
      let mut labels = vec![IMAGE_CORE];
      if image.vendor_available {
        labels.push(IMAGE_VENDOR);
      }
      if image.product_available {
        labels.push(IMAGE_PRODUCT);
      }
      labels
    }
    Partition::Vendor => vec![IMAGE_VENDOR],
    Partition::Product => vec![IMAGE_PRODUCT],
  };
  if image.recovery_available {
    labels.push(IMAGE_RECOVERY);
  }
  if image.ramdisk_available {
    labels.push(IMAGE_RAMDISK);
  }
  labels
}

impl Axis for ImageAxis {
  fn name(&self) -> &'static str {
    AXIS_IMAGE
  }

  fn split(&self, ctx: &AxisContext<'_>, variant: &Variant) -> Vec<String> {
    image_labels(&ctx.graph.module(variant.module).decl.image)
      .into_iter()
      .map(String::from)
      .collect()
  }

  fn outgoing(&self, _ctx: &AxisContext<'_>, _source: &Variant, _edge: &DepEdge, source_label: &str) -> String {
    source_label.to_string()
  }

  fn incoming(&self, ctx: &AxisContext<'_>, target: &Variant, desired: &str) -> String {
    let offered = ctx.graph.offered_labels(target.id, AXIS_IMAGE);
    if let [only] = offered.as_slice() {
      return only.to_string();
    }
    offered_or_first(ctx, target, AXIS_IMAGE, desired)
  }

  fn mutate(&self, _ctx: &AxisContext<'_>, _variant: &Variant, label: &str) -> PassRecord {
    let record = PassRecord::new(label);
    if label == IMAGE_CORE {
      record
    } else {
      record.with_property(PROP_PARTITION, label)
    }
  }
}
