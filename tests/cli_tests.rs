#[cfg(test)]
mod tests {
    use clap::Parser;
    use pedalsyncrs::cli::validate_device;
    use pedalsyncrs::*;
    use std::path::PathBuf;

    #[cfg(feature = "test-mock")]
    #[test]
    fn test_device_list() {
        let devices = handle_device_list();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0], "Mock Device 1");
        assert_eq!(devices[1], "Mock Device 2");
    }

    #[test]
    fn test_args_with_device_binding() {
        let args = Args::parse_from(["test", "--bind-to-device", "Mock Device 1"]);
        assert_eq!(args.bind_to_device, Some("Mock Device 1".to_string()));
        assert!(!args.device_list);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_args_without_device_binding() {
        let args = Args::parse_from(["test"]);
        assert_eq!(args.bind_to_device, None);
        assert!(!args.device_list);
    }

    #[test]
    fn test_args_device_list_flag() {
        let args = Args::parse_from(["test", "--device-list"]);
        assert!(args.device_list);
    }

    #[test]
    fn test_args_with_config_path() {
        let args = Args::parse_from(["test", "--config", "pedals.toml"]);
        assert_eq!(args.config, Some(PathBuf::from("pedals.toml")));
    }

    #[test]
    fn test_valid_device_binding() {
        let devices = vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()];
        assert!(validate_device("Mock Device 1", &devices).is_ok());
        // Partial names match, as port names carry client prefixes
        assert!(validate_device("Device 2", &devices).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let devices = vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()];
        let error_msg = validate_device("Nonexistent Device", &devices).unwrap_err();
        assert!(error_msg.contains("'Nonexistent Device' not found"));
        assert!(error_msg.contains("  - Mock Device 1\n"));
        assert!(error_msg.contains("  - Mock Device 2\n"));
    }

    #[test]
    fn test_invalid_device_binding_with_no_devices() {
        assert!(validate_device("Anything", &[]).is_err());
    }
}
