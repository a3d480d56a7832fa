//! Prints the SafeEvict CustomResourceDefinition as YAML.

use kube::CustomResourceExt;
use node_image_updater::SafeEvict;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&SafeEvict::crd())?);
    Ok(())
}
