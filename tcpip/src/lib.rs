pub mod buffer;
pub mod checksum;
pub mod header;
pub mod icmp;
pub mod icmpv6;
pub mod ipv4;
pub mod pseudo_header;
pub mod udp;
