use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    ABSENT_PARAM_MARKER, CalibrationError, DatePattern, Error, ParamPolicy, Params, Segment,
    Template, TemplateCache, TemplateError,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_milli_opt(9, 5, 3, 42)
        .unwrap()
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|&(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn render(source: &str, serial: u64, params: &Params) -> String {
    Template::parse(source)
        .unwrap()
        .render(serial, now(), params, ParamPolicy::Lenient)
        .unwrap()
}

#[test]
fn parses_literals_dates_params_and_serial() {
    let template = Template::parse("ENV${code}${YYYYMMddHHmmssSSS}#{000000}").unwrap();

    assert_eq!(
        template.segments(),
        [
            Segment::Literal("ENV".to_string()),
            Segment::Param("code".to_string()),
            Segment::Date(DatePattern::Millisecond),
            Segment::Serial { width: 6 },
        ]
    );
    assert_eq!(template.serial_width(), 6);
    assert_eq!(template.source(), "ENV${code}${YYYYMMddHHmmssSSS}#{000000}");
}

#[test]
fn date_placeholders_match_case_insensitively() {
    let template = Template::parse("${yyyy}${YyYyMm}#{0}").unwrap();
    assert_eq!(
        template.date_patterns().collect::<Vec<_>>(),
        [DatePattern::Year, DatePattern::YearMonth]
    );
    assert_eq!(template.param_names().count(), 0);
}

#[test]
fn rejects_templates_without_exactly_one_serial() {
    assert_eq!(Template::parse("ORD${YYYY}"), Err(TemplateError::MissingSerial));
    assert_eq!(
        Template::parse("#{00}-#{00}"),
        Err(TemplateError::MultipleSerials)
    );
    assert_eq!(Template::parse("A#{}"), Err(TemplateError::EmptySerial));
}

#[test]
fn unterminated_placeholder_is_literal() {
    let template = Template::parse("#{000}X${open").unwrap();
    assert_eq!(
        template.segments(),
        [
            Segment::Serial { width: 3 },
            Segment::Literal("X${open".to_string()),
        ]
    );
    assert_eq!(render("#{000}X${open", 7, &Params::new()), "007X${open");
}

#[test]
fn renders_every_date_pattern() {
    let cases = [
        ("YYYY", "2024"),
        ("YYYYMM", "202403"),
        ("YYYYMMDD", "20240307"),
        ("YYYYMMDDHH", "2024030709"),
        ("YYYYMMDDHHmm", "202403070905"),
        ("YYYYMMDDHHmmss", "20240307090503"),
        ("YYYYMMddHHmmssSSS", "20240307090503042"),
    ];
    for (placeholder, expected) in cases {
        let pattern = DatePattern::from_placeholder(placeholder).unwrap();
        let rendered = pattern.format(now());
        assert_eq!(rendered, expected, "{placeholder}");
        assert_eq!(rendered.len(), pattern.width(), "{placeholder}");
    }
}

#[test]
fn renders_year_scenario() {
    assert_eq!(render("ORD${YYYY}#{0000}", 1, &Params::new()), "ORD20240001");
    assert_eq!(render("ORD${YYYY}#{0000}", 2, &Params::new()), "ORD20240002");
}

#[test]
fn serial_is_zero_padded_to_field_width() {
    for width in 1..=6_u32 {
        let source = format!("N#{{{}}}", "0".repeat(width as usize));
        let template = Template::parse(&source).unwrap();
        for n in [0, 1, 9, 10u64.pow(width) - 1] {
            let code = template
                .render(n, now(), &Params::new(), ParamPolicy::Lenient)
                .unwrap();
            let digits = &code[1..];
            assert_eq!(digits.len(), width as usize);
            assert_eq!(digits.parse::<u64>().unwrap(), n);
        }
    }
}

#[test]
fn overflowing_serial_renders_all_digits() {
    let template = Template::parse("A#{00}").unwrap();
    assert!(template.overflows(100));
    assert!(!template.overflows(99));
    assert_eq!(render("A#{00}", 12345, &Params::new()), "A12345");
}

#[test]
fn named_params_substitute_caller_values() {
    let values = params(&[("code", "HX"), ("unused", "zz")]);
    assert_eq!(render("ENV${code}-#{000}", 3, &values), "ENVHX-003");
}

#[test]
fn missing_param_is_marked_when_lenient() {
    assert_eq!(
        render("ENV${code}#{000}", 3, &Params::new()),
        format!("ENV{ABSENT_PARAM_MARKER}003")
    );
}

#[test]
fn missing_param_fails_when_strict() {
    let template = Template::parse("ENV${code}#{000}").unwrap();
    let err = template
        .render(3, now(), &Params::new(), ParamPolicy::Strict)
        .unwrap_err();
    assert_eq!(
        err,
        Error::MissingParameter {
            name: "code".to_string()
        }
    );
}

#[test]
fn extracts_serial_with_fixed_suffix() {
    let template = Template::parse("ENV${code}${YYYYMMddHHmmssSSS}#{000000}").unwrap();
    assert_eq!(
        template.extract_serial("ENVHX20200205092108103000003"),
        Ok(3)
    );

    let template = Template::parse("${dept}-#{0000}-${YYYY}X").unwrap();
    assert_eq!(template.extract_serial("SALES-0042-2024X"), Ok(42));
}

#[test]
fn extracts_serial_with_fixed_prefix_when_suffix_varies() {
    let template = Template::parse("ORD${YYYY}#{0000}${site}").unwrap();
    assert_eq!(template.extract_serial("ORD20240017WEST"), Ok(17));
}

#[test]
fn extraction_recovers_rendered_serial() {
    let values = params(&[("code", "HX"), ("site", "NORTH")]);
    let sources = [
        "ORD${YYYY}#{0000}",
        "ENV${code}${YYYYMMddHHmmssSSS}#{000000}",
        "#{00000}${site}",
        "${code}/${YYYYMM}/#{000}/B",
    ];
    for source in sources {
        let template = Template::parse(source).unwrap();
        let max = 10u64.pow(u32::try_from(template.serial_width()).unwrap()) - 1;
        for n in [0, 1, 42, max] {
            let code = template
                .render(n, now(), &values, ParamPolicy::Lenient)
                .unwrap();
            assert_eq!(template.extract_serial(&code), Ok(n), "{source} / {code}");
        }
    }
}

#[test]
fn extraction_reports_unlocatable_and_non_numeric_fields() {
    let template = Template::parse("${a}#{000}${b}").unwrap();
    assert!(matches!(
        template.extract_serial("x001y"),
        Err(CalibrationError::Unlocatable { width: 3, .. })
    ));

    let template = Template::parse("ORD#{0000}").unwrap();
    assert!(matches!(
        template.extract_serial("ORD"),
        Err(CalibrationError::Unlocatable { .. })
    ));
    assert!(matches!(
        template.extract_serial("ORD12A4"),
        Err(CalibrationError::NotNumeric { ref digits, .. }) if digits == "12A4"
    ));
}

#[test]
fn template_cache_parses_each_source_once() {
    let cache = TemplateCache::new();
    let first = cache.get("ORD#{000}").unwrap();
    let second = cache.get("ORD#{000}").unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    let err = cache.get("no serial").unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTemplate {
            reason: TemplateError::MissingSerial,
            ..
        }
    ));
    assert_eq!(cache.len(), 1);
}

#[test]
fn check_params_only_rejects_under_strict() {
    let template = Template::parse("${dept}-${site}-#{00}").unwrap();
    let partial = params(&[("dept", "HR")]);

    assert_eq!(template.check_params(&partial, ParamPolicy::Lenient), Ok(()));
    assert_eq!(
        template.check_params(&partial, ParamPolicy::Strict),
        Err(Error::MissingParameter {
            name: "site".to_string()
        })
    );

    let full = params(&[("dept", "HR"), ("site", "N")]);
    assert_eq!(template.check_params(&full, ParamPolicy::Strict), Ok(()));
}
