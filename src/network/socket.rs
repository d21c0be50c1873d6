//! Socket helpers: binding, address resolution, TTL/TOS

use std::net::{
    IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, ToSocketAddrs, UdpSocket,
};

use tracing::debug;

use super::error::NetError;

fn local_addr(ifaddr: Option<Ipv4Addr>, port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(
        ifaddr.unwrap_or(Ipv4Addr::UNSPECIFIED),
        port,
    ))
}

/// Bind UDP socket.
///
/// Interface address dipakai jika diberikan, selain itu default address;
/// port 0 berarti ephemeral. Returns socket dan local address hasil bind.
pub fn bind_udp(ifaddr: Option<Ipv4Addr>, port: u16) -> Result<(UdpSocket, SocketAddr), NetError> {
    debug!(?ifaddr, port, "bind udp");
    let socket = UdpSocket::bind(local_addr(ifaddr, port))?;
    let bound = socket.local_addr()?;
    Ok((socket, bound))
}

/// Bind TCP listening socket (aturan address/port sama dengan [`bind_udp`])
pub fn bind_tcp(
    ifaddr: Option<Ipv4Addr>,
    port: u16,
) -> Result<(TcpListener, SocketAddr), NetError> {
    debug!(?ifaddr, port, "bind tcp");
    let listener = TcpListener::bind(local_addr(ifaddr, port))?;
    let bound = listener.local_addr()?;
    Ok((listener, bound))
}

/// Resolve hostname atau dotted quad ke IPv4 address
pub fn host_to_addr(host: &str) -> Result<Ipv4Addr, NetError> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }
    let addrs = (host, 0)
        .to_socket_addrs()
        .map_err(|_| NetError::Resolve(host.to_string()))?;
    addrs
        .filter_map(|a| match a.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| NetError::Resolve(host.to_string()))
}

/// IPv4 address dari interface name, misal "eth0"
#[cfg(unix)]
pub fn ifname_to_addr(ifname: &str) -> Result<Ipv4Addr, NetError> {
    use std::ffi::CStr;

    let mut ifap: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: getifaddrs mengisi linked list yang dibebaskan di bawah
    if unsafe { libc::getifaddrs(&mut ifap) } != 0 {
        return Err(NetError::Io(std::io::Error::last_os_error()));
    }

    let mut found = None;
    let mut cur = ifap;
    while !cur.is_null() {
        // SAFETY: cur non-null dan berasal dari list getifaddrs
        let ifa = unsafe { &*cur };
        cur = ifa.ifa_next;
        if ifa.ifa_addr.is_null() || ifa.ifa_name.is_null() {
            continue;
        }
        let name = unsafe { CStr::from_ptr(ifa.ifa_name) };
        if name.to_bytes() != ifname.as_bytes() {
            continue;
        }
        // SAFETY: ifa_addr non-null
        let family = unsafe { (*ifa.ifa_addr).sa_family };
        if family as libc::c_int == libc::AF_INET {
            let sin = unsafe { &*(ifa.ifa_addr as *const libc::sockaddr_in) };
            found = Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
            break;
        }
    }

    unsafe { libc::freeifaddrs(ifap) };
    found.ok_or_else(|| NetError::NoSuchInterface(ifname.to_string()))
}

#[cfg(not(unix))]
pub fn ifname_to_addr(ifname: &str) -> Result<Ipv4Addr, NetError> {
    Err(NetError::NoSuchInterface(ifname.to_string()))
}

/// Set IP TTL untuk outgoing datagram
pub fn set_ttl(socket: &UdpSocket, ttl: u8) -> Result<(), NetError> {
    socket.set_ttl(ttl as u32)?;
    Ok(())
}

/// Set IP TOS byte untuk outgoing datagram
#[cfg(unix)]
pub fn set_tos(socket: &UdpSocket, tos: u8) -> Result<(), NetError> {
    use std::os::unix::io::AsRawFd;

    let optval: libc::c_int = tos as libc::c_int;
    // SAFETY: fd valid selama socket hidup, optval di stack
    let rc = unsafe {
        libc::setsockopt(
            socket.as_raw_fd(),
            libc::IPPROTO_IP,
            libc::IP_TOS,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc < 0 {
        return Err(NetError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn set_tos(_socket: &UdpSocket, _tos: u8) -> Result<(), NetError> {
    Ok(())
}
