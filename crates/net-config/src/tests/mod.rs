mod writer_tests;

use osd_network_core::HwAddr;

pub(crate) fn mac(s: &str) -> HwAddr {
    s.parse().unwrap()
}
