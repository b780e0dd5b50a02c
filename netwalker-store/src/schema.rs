/// DDL for the inventory schema. Each statement is idempotent: re-running
/// `initialize-schema` against an already-initialized database is a no-op.
pub const STATEMENTS: &[&str] = &[
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'devices')
    CREATE TABLE devices (
        device_id INT IDENTITY PRIMARY KEY,
        device_name NVARCHAR(255) NOT NULL,
        serial_number NVARCHAR(255) NOT NULL,
        platform NVARCHAR(64) NOT NULL,
        hardware_model NVARCHAR(255) NOT NULL,
        status NVARCHAR(32) NOT NULL,
        status_reason NVARCHAR(400) NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_devices_name_serial UNIQUE (device_name, serial_number)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'device_versions')
    CREATE TABLE device_versions (
        device_id INT NOT NULL REFERENCES devices(device_id) ON DELETE CASCADE,
        software_version NVARCHAR(255) NOT NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_device_versions UNIQUE (device_id, software_version)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'device_interfaces')
    CREATE TABLE device_interfaces (
        device_id INT NOT NULL REFERENCES devices(device_id) ON DELETE CASCADE,
        interface_name NVARCHAR(255) NOT NULL,
        ip_address NVARCHAR(15) NULL,
        subnet_mask TINYINT NULL,
        interface_type NVARCHAR(32) NOT NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_device_interfaces UNIQUE (device_id, interface_name, ip_address)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'vlans')
    CREATE TABLE vlans (
        vlan_number SMALLINT NOT NULL,
        vlan_name NVARCHAR(255) NOT NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_vlans UNIQUE (vlan_number, vlan_name)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'device_vlans')
    CREATE TABLE device_vlans (
        device_id INT NOT NULL REFERENCES devices(device_id) ON DELETE CASCADE,
        vlan_number SMALLINT NOT NULL,
        vlan_name NVARCHAR(255) NOT NULL,
        port_count INT NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_device_vlans UNIQUE (device_id, vlan_number)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'device_neighbors')
    CREATE TABLE device_neighbors (
        neighbor_id INT IDENTITY PRIMARY KEY,
        source_device_id INT NOT NULL REFERENCES devices(device_id) ON DELETE CASCADE,
        source_interface NVARCHAR(255) NOT NULL,
        destination_device_id INT NOT NULL,
        destination_interface NVARCHAR(255) NOT NULL,
        protocol NVARCHAR(8) NOT NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_device_neighbors UNIQUE (source_device_id, source_interface, destination_device_id, destination_interface)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.foreign_keys WHERE name = 'fk_neighbors_destination')
    ALTER TABLE device_neighbors ADD CONSTRAINT fk_neighbors_destination
        FOREIGN KEY (destination_device_id) REFERENCES devices(device_id)"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'ipv4_prefixes')
    CREATE TABLE ipv4_prefixes (
        device_id INT NOT NULL REFERENCES devices(device_id) ON DELETE CASCADE,
        vrf NVARCHAR(128) NOT NULL,
        prefix NVARCHAR(18) NOT NULL,
        source NVARCHAR(16) NOT NULL,
        protocol_code CHAR(1) NULL,
        first_seen DATETIME2 NOT NULL,
        last_seen DATETIME2 NOT NULL,
        CONSTRAINT uq_ipv4_prefixes UNIQUE (device_id, vrf, prefix, source)
    )"#,
    r#"IF NOT EXISTS (SELECT * FROM sys.tables WHERE name = 'ipv4_prefix_summarization')
    CREATE TABLE ipv4_prefix_summarization (
        device_id INT NOT NULL REFERENCES devices(device_id) ON DELETE CASCADE,
        vrf NVARCHAR(128) NOT NULL,
        summary_prefix NVARCHAR(18) NOT NULL,
        component_prefix NVARCHAR(18) NOT NULL,
        CONSTRAINT uq_ipv4_prefix_summarization UNIQUE (device_id, vrf, summary_prefix, component_prefix)
    )"#,
];
