use approx::assert_abs_diff_eq;

use dftd3::{DampingFamily, DampingParam, Error, ParamTweaks};

#[test]
fn family_names_parse_including_aliases() {
    assert_eq!(
        "d3bj".parse::<DampingFamily>().unwrap(),
        DampingFamily::Rational
    );
    assert_eq!(
        "d3zero".parse::<DampingFamily>().unwrap(),
        DampingFamily::Zero
    );
    assert_eq!(
        "d3bjm".parse::<DampingFamily>().unwrap(),
        DampingFamily::ModifiedRational
    );
    assert_eq!(
        "d3mbj".parse::<DampingFamily>().unwrap(),
        DampingFamily::ModifiedRational
    );
    assert_eq!(
        "d3zerom".parse::<DampingFamily>().unwrap(),
        DampingFamily::ModifiedZero
    );
    assert_eq!(
        "d3mzero".parse::<DampingFamily>().unwrap(),
        DampingFamily::ModifiedZero
    );
    assert_eq!(
        "d3op".parse::<DampingFamily>().unwrap(),
        DampingFamily::OptimizedPower
    );
}

#[test]
fn unknown_family_name_is_an_input_error() {
    assert!(matches!(
        "d4bj".parse::<DampingFamily>(),
        Err(Error::Input(_))
    ));
}

#[test]
fn method_lookup_fills_rational_parameters() {
    let param = DampingParam::from_method(DampingFamily::Rational, "TPSS").unwrap();
    match param {
        DampingParam::Rational(p) => {
            assert_abs_diff_eq!(p.s8, 1.9435);
            assert_abs_diff_eq!(p.a1, 0.4535);
            assert_abs_diff_eq!(p.a2, 4.4752);
            // family-wide defaults
            assert_abs_diff_eq!(p.s6, 1.0);
            assert_abs_diff_eq!(p.s9, 1.0);
            assert_abs_diff_eq!(p.alp, 14.0);
        }
        other => panic!("expected rational damping, got {other:?}"),
    }
}

#[test]
fn method_lookup_fills_zero_parameters() {
    let param = DampingParam::from_method(DampingFamily::Zero, "pbe").unwrap();
    match param {
        DampingParam::Zero(p) => {
            assert_abs_diff_eq!(p.rs6, 1.217);
            assert_abs_diff_eq!(p.s8, 0.722);
            assert_abs_diff_eq!(p.rs8, 1.0);
        }
        other => panic!("expected zero damping, got {other:?}"),
    }
}

#[test]
fn unknown_method_is_an_input_error() {
    assert!(matches!(
        DampingParam::from_method(DampingFamily::Rational, "not-a-functional"),
        Err(Error::Input(_))
    ));
}

#[test]
fn tweaks_take_precedence_over_method() {
    let mut tweaks = ParamTweaks::default();
    tweaks.s8 = Some(0.5);
    tweaks.a1 = Some(0.4);
    tweaks.a2 = Some(5.0);

    let param = DampingParam::build(DampingFamily::Rational, Some("tpss"), &tweaks).unwrap();
    match param {
        DampingParam::Rational(p) => {
            assert_abs_diff_eq!(p.s8, 0.5);
            assert_abs_diff_eq!(p.a1, 0.4);
            assert_abs_diff_eq!(p.a2, 5.0);
        }
        other => panic!("expected rational damping, got {other:?}"),
    }
}

#[test]
fn missing_required_tweak_is_an_input_error() {
    let mut tweaks = ParamTweaks::default();
    tweaks.s8 = Some(0.5); // a1, a2 missing
    assert!(matches!(
        DampingParam::from_tweaks(DampingFamily::Rational, &tweaks),
        Err(Error::Input(_))
    ));
}

#[test]
fn foreign_tweak_for_family_is_an_input_error() {
    let mut tweaks = ParamTweaks::default();
    tweaks.s8 = Some(0.5);
    tweaks.rs6 = Some(1.2);
    tweaks.a1 = Some(0.4); // rational parameter, zero damping takes none
    assert!(matches!(
        DampingParam::from_tweaks(DampingFamily::Zero, &tweaks),
        Err(Error::Input(_))
    ));
}

#[test]
fn neither_method_nor_tweaks_is_an_input_error() {
    let tweaks = ParamTweaks::default();
    assert!(matches!(
        DampingParam::build(DampingFamily::Rational, None, &tweaks),
        Err(Error::Input(_))
    ));
}

#[test]
fn optimized_power_requires_explicit_tweaks() {
    // No tabulated sets for this family; method lookup must fail loudly.
    assert!(matches!(
        DampingParam::from_method(DampingFamily::OptimizedPower, "pbe"),
        Err(Error::Input(_))
    ));

    let mut tweaks = ParamTweaks::default();
    tweaks.s8 = Some(1.0);
    tweaks.a1 = Some(0.5);
    tweaks.a2 = Some(3.0);
    tweaks.bet = Some(2.0);
    let param = DampingParam::from_tweaks(DampingFamily::OptimizedPower, &tweaks).unwrap();
    assert_eq!(param.family(), DampingFamily::OptimizedPower);
}

#[test]
fn tweaks_set_by_name() {
    let mut tweaks = ParamTweaks::default();
    assert!(tweaks.is_empty());
    tweaks.set("s8", 0.7875).unwrap();
    tweaks.set("a1", 0.4289).unwrap();
    tweaks.set("a2", 4.4407).unwrap();
    assert!(!tweaks.is_empty());
    assert_eq!(tweaks.s8, Some(0.7875));
    assert!(matches!(tweaks.set("sigma", 1.0), Err(Error::Input(_))));
}
