//! Service labels for well-known TCP ports.

/// Label used for ports missing from the table.
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Well-known ports, sorted by port number for binary search.
static SERVICES: &[(u16, &str)] = &[
    (20, "FTP-Data"),
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (69, "TFTP"),
    (80, "HTTP"),
    (88, "Kerberos"),
    (110, "POP3"),
    (111, "RPCBind"),
    (119, "NNTP"),
    (123, "NTP"),
    (135, "RPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (161, "SNMP"),
    (179, "BGP"),
    (389, "LDAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (465, "SMTPS"),
    (514, "Syslog"),
    (587, "Submission"),
    (631, "IPP"),
    (636, "LDAPS"),
    (873, "Rsync"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1080, "SOCKS"),
    (1194, "OpenVPN"),
    (1433, "MSSQL"),
    (1521, "Oracle"),
    (1723, "PPTP"),
    (1883, "MQTT"),
    (2049, "NFS"),
    (2375, "Docker"),
    (2376, "Docker-TLS"),
    (3000, "Grafana"),
    (3128, "Squid"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5000, "UPnP"),
    (5060, "SIP"),
    (5432, "PostgreSQL"),
    (5672, "AMQP"),
    (5900, "VNC"),
    (6379, "Redis"),
    (6443, "Kubernetes-API"),
    (8000, "HTTP-Alt"),
    (8080, "HTTP-Alt"),
    (8443, "HTTPS-Alt"),
    (8888, "HTTP-Alt"),
    (9090, "Prometheus"),
    (9092, "Kafka"),
    (9200, "Elasticsearch"),
    (11211, "Memcached"),
    (27017, "MongoDB"),
];

/// Look up the conventional service for a port, if it has one.
pub fn get_service_name(port: u16) -> Option<&'static str> {
    SERVICES
        .binary_search_by_key(&port, |&(p, _)| p)
        .ok()
        .map(|idx| SERVICES[idx].1)
}

/// Service label for display. Returns [`UNKNOWN_SERVICE`] for unlisted ports.
pub fn get_service_description(port: u16) -> &'static str {
    get_service_name(port).unwrap_or(UNKNOWN_SERVICE)
}
