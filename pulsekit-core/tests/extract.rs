use extraction::{
    require_f64, CountData, ExtractedPulses, MethodDecl, MethodError, MethodSource, ParamMap,
    ParamSpec,
};
use pulsekit_core::{ExtractionManager, ExtractionSettings, SettingsSnapshot};
use serde_json::Value;

fn select(manager: &mut ExtractionManager, method: &str) {
    let mut values = SettingsSnapshot::new();
    values.insert("method".to_string(), Value::from(method));
    manager.set_settings(&values);
}

#[test]
fn extract_dispatches_the_selected_ungated_method() {
    let mut manager = ExtractionManager::with_bundled_methods(ExtractionSettings::default());
    select(&mut manager, "threshold");

    let data = CountData::Ungated(vec![0.0, 0.0, 12.0, 15.0, 13.0, 0.0, 0.0]);
    let pulses = manager.extract(&data).expect("extraction");
    assert_eq!(pulses.rising_ind, vec![2]);
    assert_eq!(pulses.falling_ind, vec![4]);
}

#[test]
fn extract_dispatches_the_selected_gated_method() {
    let mut manager = ExtractionManager::with_bundled_methods(ExtractionSettings::default());
    manager.fast_counter_settings.is_gated = true;
    select(&mut manager, "threshold");

    let data = CountData::Gated(vec![vec![0.0, 6.0, 0.0], vec![0.0, 6.0, 0.0]]);
    let pulses = manager.extract(&data).expect("extraction");
    assert_eq!(pulses.rising_ind, vec![1]);
    assert_eq!(pulses.falling_ind, vec![1]);
}

#[test]
fn a_gating_mismatch_is_reported_but_dispatch_proceeds() {
    let mut manager = ExtractionManager::with_bundled_methods(ExtractionSettings::default());
    select(&mut manager, "threshold");
    manager.take_diagnostics();

    // Ungated mode, gated buffer: the mismatch is logged, dispatch still
    // runs and the method itself rejects the shape.
    let data = CountData::Gated(vec![vec![1.0, 2.0]]);
    let err = manager.extract(&data).expect_err("shape rejection");
    assert!(err.contains("ungated"));

    let diagnostics = manager.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("is_gated"));
}

#[test]
fn extract_fails_when_no_method_matches_the_gating_mode() {
    struct UngatedOnly;

    impl MethodSource for UngatedOnly {
        fn source_name(&self) -> &str {
            "ungated_only"
        }

        fn method_decls(&self) -> Vec<MethodDecl> {
            vec![MethodDecl {
                raw_name: "ungated_solo",
                params: &[],
                func: |_, _| Ok(ExtractedPulses::default()),
            }]
        }
    }

    let mut manager = ExtractionManager::new(
        &[&UngatedOnly as &dyn MethodSource],
        ExtractionSettings {
            method: "solo".to_string(),
            ..ExtractionSettings::default()
        },
    );
    manager.fast_counter_settings.is_gated = true;
    manager.take_diagnostics();

    let err = manager
        .extract(&CountData::Gated(vec![vec![1.0]]))
        .expect_err("no gated method");
    assert!(err.contains("solo"));
}

#[test]
fn an_unresolved_parameter_surfaces_as_a_hard_failure() {
    struct NeedySource;

    fn needy(_: &CountData, kwargs: &ParamMap) -> Result<ExtractedPulses, MethodError> {
        require_f64(kwargs, "needy", "gamma")?;
        Ok(ExtractedPulses::default())
    }

    impl MethodSource for NeedySource {
        fn source_name(&self) -> &str {
            "needy"
        }

        fn method_decls(&self) -> Vec<MethodDecl> {
            vec![MethodDecl {
                raw_name: "ungated_needy",
                params: &[ParamSpec {
                    name: "gamma",
                    default: None,
                }],
                func: needy,
            }]
        }
    }

    let mut manager = ExtractionManager::new(
        &[&NeedySource as &dyn MethodSource],
        ExtractionSettings {
            method: "needy".to_string(),
            ..ExtractionSettings::default()
        },
    );
    manager.take_diagnostics();

    let err = manager
        .extract(&CountData::Ungated(vec![1.0]))
        .expect_err("missing argument");
    assert!(err.contains("missing argument"));
    assert!(err.contains("gamma"));

    // The unresolved parameter was also reported during binding.
    let diagnostics = manager.take_diagnostics();
    assert!(diagnostics.iter().any(|d| d.contains("gamma")));
}

#[test]
fn module_owned_maps_resolve_as_method_parameters() {
    struct SamplingAware;

    fn uses_sampling(_: &CountData, kwargs: &ParamMap) -> Result<ExtractedPulses, MethodError> {
        let info = kwargs
            .get("sampling_information")
            .and_then(Value::as_object)
            .ok_or_else(|| MethodError::MissingArgument {
                method: "sampling".to_string(),
                name: "sampling_information".to_string(),
            })?;
        let bins = info
            .get("number_of_samples")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(ExtractedPulses {
            rising_ind: vec![bins as usize],
            falling_ind: Vec::new(),
        })
    }

    impl MethodSource for SamplingAware {
        fn source_name(&self) -> &str {
            "sampling_aware"
        }

        fn method_decls(&self) -> Vec<MethodDecl> {
            vec![MethodDecl {
                raw_name: "ungated_sampling",
                params: &[ParamSpec {
                    name: "sampling_information",
                    default: None,
                }],
                func: uses_sampling,
            }]
        }
    }

    let mut manager = ExtractionManager::new(
        &[&SamplingAware as &dyn MethodSource],
        ExtractionSettings {
            method: "sampling".to_string(),
            ..ExtractionSettings::default()
        },
    );
    manager
        .sampling_information
        .insert("number_of_samples".to_string(), Value::from(64));
    manager.take_diagnostics();

    let pulses = manager
        .extract(&CountData::Ungated(vec![1.0]))
        .expect("extraction");
    assert_eq!(pulses.rising_ind, vec![64]);
    assert!(manager.take_diagnostics().is_empty());

    // The container binds as an argument but stays off the settings
    // surface.
    assert!(!manager.get_settings().contains_key("sampling_information"));
}

#[test]
fn extraction_settings_feed_the_dispatched_method() {
    let mut manager = ExtractionManager::with_bundled_methods(ExtractionSettings::default());
    select(&mut manager, "threshold");

    let mut values = SettingsSnapshot::new();
    values.insert("count_threshold".to_string(), Value::from(100));
    manager.set_settings(&values);

    // Nothing reaches the raised threshold any more.
    let data = CountData::Ungated(vec![0.0, 0.0, 12.0, 15.0, 13.0, 0.0, 0.0]);
    let pulses = manager.extract(&data).expect("extraction");
    assert!(pulses.rising_ind.is_empty());
    assert!(pulses.falling_ind.is_empty());
}
