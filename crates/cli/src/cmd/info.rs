use nrtm_dist_lib::config::DistConfig;
use nrtm_dist_lib::package::ArchiveFormat;
use nrtm_dist_lib::platform::Platform;

use crate::output::print_stat;

pub fn cmd_info() {
  let config = DistConfig::default();

  println!("System:");
  match Platform::current() {
    Some(platform) => print_stat("Platform", &platform.triple()),
    _ => println!("Could not detect platform."),
  }
  print_stat("Archive", ArchiveFormat::for_os(config.host_os).extension());

  println!();
  println!("Layout:");
  print_stat("Output", &format!("{}[-<target>]/bin", config.out_root));
  print_stat("Dist", &format!("{}[-<target>]", config.dist_name));
  print_stat("Rename", &format!("{} -> {}", config.rename.from, config.rename.to));
}
