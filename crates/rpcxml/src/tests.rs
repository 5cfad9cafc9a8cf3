use crate::*;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeZone;
use std::collections::BTreeMap;
use std::collections::VecDeque;

const SOME_METHOD_XML: &str = "<methodCall><methodName>Some.Method</methodName><params><param><value><int>123</int></value></param><param><value><double>3.145926</double></value></param><param><value><string>Hello, World!</string></value></param><param><value><boolean>0</boolean></value></param><param><value><struct><member><name>Foo</name><value><int>42</int></value></member><member><name>Bar</name><value><string>I'm Bar</string></value></member><member><name>Data</name><value><array><data><value><int>1</int></value><value><int>2</int></value><value><int>3</int></value></data></array></value></member></struct></value></param><param><value><dateTime.iso8601>20120717T14:08:55</dateTime.iso8601></value></param><param><value><base64>eW91IGNhbid0IHJlYWQgdGhpcyE=</base64></value></param></params></methodCall>";

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
}

fn some_method_params() -> Struct {
    Struct::new()
        .member("Int", 123)
        .member("Float", 3.145926)
        .member("Str", "Hello, World!")
        .member("Bool", false)
        .member(
            "Sub",
            Struct::new()
                .member("Foo", 42)
                .member("Bar", "I'm Bar")
                .member("Data", vec![1, 2, 3]),
        )
        .member("Time", ts(2012, 7, 17, 14, 8, 55))
        .member("Base64", Bytes::from("you can't read this!"))
}

#[derive(Debug)]
struct Raw(&'static str);

impl Marshal for Raw {
    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(self.0.as_bytes().to_vec())
    }
}

#[derive(Debug)]
struct Failing;

impl Marshal for Failing {
    fn marshal(&self) -> Result<Vec<u8>> {
        Err(Error::marshal("boom"))
    }
}

#[derive(Debug)]
struct NotUtf8;

impl Marshal for NotUtf8 {
    fn marshal(&self) -> Result<Vec<u8>> {
        Ok(vec![0x3c, 0xff, 0xfe])
    }
}

// ============================================================================
//  SCALARS
// ============================================================================

#[test]
fn test_int() -> Result<()> {
    assert_eq!(to_string(&123)?, "<value><int>123</int></value>");
    assert_eq!(to_string(&-7i64)?, "<value><int>-7</int></value>");
    assert_eq!(to_string(&0u16)?, "<value><int>0</int></value>");
    assert_eq!(to_string(&u32::MAX)?, "<value><int>4294967295</int></value>");
    assert_eq!(to_string(&-3isize)?, "<value><int>-3</int></value>");
    Ok(())
}

#[test]
fn test_int_parses_back() -> Result<()> {
    for n in [0, 1, -1, 9, 10, -100, 1_000_007, i64::MAX, i64::MIN] {
        let xml = to_string(&n)?;
        let body = xml
            .strip_prefix("<value><int>")
            .and_then(|s| s.strip_suffix("</int></value>"))
            .unwrap();
        assert!(!body.starts_with('0') || body == "0", "leading zero in {body}");
        assert_eq!(body.parse::<i64>().unwrap(), n);
    }
    Ok(())
}

#[test]
fn test_double_fixed_point() -> Result<()> {
    assert_eq!(to_string(&3.145926)?, "<value><double>3.145926</double></value>");
    assert_eq!(to_string(&1.0)?, "<value><double>1.000000</double></value>");
    assert_eq!(to_string(&-0.5)?, "<value><double>-0.500000</double></value>");
    assert_eq!(to_string(&0.1f32)?, "<value><double>0.100000</double></value>");
    assert_eq!(to_string(&1.0000004)?, "<value><double>1.000000</double></value>");
    assert_eq!(
        to_string(&1e21)?,
        "<value><double>1000000000000000000000.000000</double></value>"
    );
    Ok(())
}

#[test]
fn test_string_escaping() -> Result<()> {
    assert_eq!(
        to_string(" & \" < > ")?,
        "<value><string> &amp; &quot; &lt; &gt; </string></value>"
    );
    // Already-escaped input is escaped once more, never skipped.
    assert_eq!(to_string("&amp;")?, "<value><string>&amp;amp;</string></value>");
    assert_eq!(to_string("I'm Bar")?, "<value><string>I'm Bar</string></value>");
    assert_eq!(to_string("")?, "<value><string></string></value>");
    assert_eq!(to_string(&'<')?, "<value><string>&lt;</string></value>");
    assert_eq!(to_string(&String::from("héllo 🦀"))?, "<value><string>héllo 🦀</string></value>");
    Ok(())
}

#[test]
fn test_escape_borrows_when_clean() {
    assert!(matches!(escape("Some.Method"), std::borrow::Cow::Borrowed(_)));
    assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
}

#[test]
fn test_boolean() -> Result<()> {
    assert_eq!(to_string(&true)?, "<value><boolean>1</boolean></value>");
    assert_eq!(to_string(&false)?, "<value><boolean>0</boolean></value>");
    Ok(())
}

#[test]
fn test_base64() -> Result<()> {
    assert_eq!(
        to_string(&Bytes::from("you can't read this!"))?,
        "<value><base64>eW91IGNhbid0IHJlYWQgdGhpcyE=</base64></value>"
    );
    assert_eq!(to_string(&Bytes::from(vec![0xff, 0x00]))?, "<value><base64>/wA=</base64></value>");
    assert_eq!(to_string(&Bytes::default())?, "<value><base64></base64></value>");
    Ok(())
}

#[test]
fn test_date_time() -> Result<()> {
    assert_eq!(
        to_string(&ts(2012, 7, 17, 14, 8, 55))?,
        "<value><dateTime.iso8601>20120717T14:08:55</dateTime.iso8601></value>"
    );
    assert_eq!(
        to_string(&ts(987, 1, 2, 3, 4, 5))?,
        "<value><dateTime.iso8601>09870102T03:04:05</dateTime.iso8601></value>"
    );
    Ok(())
}

#[test]
fn test_date_time_drops_subseconds() -> Result<()> {
    let t = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap().and_hms_milli_opt(23, 59, 59, 999).unwrap();
    assert_eq!(
        to_string(&t)?,
        "<value><dateTime.iso8601>20200229T23:59:59</dateTime.iso8601></value>"
    );
    Ok(())
}

#[test]
fn test_zoned_date_time_is_not_converted() -> Result<()> {
    let zone = FixedOffset::east_opt(5 * 3600).unwrap();
    let t = zone.with_ymd_and_hms(2012, 7, 17, 14, 8, 55).single().unwrap();
    assert_eq!(
        to_string(&t)?,
        "<value><dateTime.iso8601>20120717T14:08:55</dateTime.iso8601></value>"
    );
    Ok(())
}

// ============================================================================
//  ABSENT
// ============================================================================

#[test]
fn test_nil() -> Result<()> {
    assert_eq!(to_string(&None::<i32>)?, "<value><nil/></value>");
    assert_eq!(to_string(&Some(5))?, "<value><int>5</int></value>");
    assert_eq!(to_string(&())?, "<value><nil/></value>");
    assert_eq!(to_string(&Value::Nil)?, "<value><nil/></value>");
    assert_eq!(to_string(&Value::from(None::<String>))?, "<value><nil/></value>");
    Ok(())
}

#[test]
fn test_nil_inside_struct() -> Result<()> {
    let s = Struct::new().member("Ptr", Value::Nil).member("N", 1);
    assert_eq!(
        to_string(&s)?,
        "<value><struct><member><name>Ptr</name><value><nil/></value></member><member><name>N</name><value><int>1</int></value></member></struct></value>"
    );
    Ok(())
}

// ============================================================================
//  SEQUENCES
// ============================================================================

#[test]
fn test_empty_sequence() -> Result<()> {
    assert_eq!(to_string(&Vec::<i32>::new())?, "<value><array><data></data></array></value>");
    assert_eq!(to_string(&Value::Array(vec![]))?, "<value><array><data></data></array></value>");
    Ok(())
}

#[test]
fn test_sequence_keeps_order() -> Result<()> {
    assert_eq!(
        to_string(&[3, 1, 2])?,
        "<value><array><data><value><int>3</int></value><value><int>1</int></value><value><int>2</int></value></data></array></value>"
    );
    let deque: VecDeque<&str> = ["b", "a"].into_iter().collect();
    assert_eq!(
        to_string(&deque)?,
        "<value><array><data><value><string>b</string></value><value><string>a</string></value></data></array></value>"
    );
    Ok(())
}

#[test]
fn test_nested_and_mixed_sequences() -> Result<()> {
    let nested = vec![vec![1], vec![]];
    assert_eq!(
        to_string(&nested)?,
        "<value><array><data><value><array><data><value><int>1</int></value></data></array></value><value><array><data></data></array></value></data></array></value>"
    );

    let mixed = Value::Array(vec![Value::Int(1), Value::from("x"), Value::Nil, Value::Boolean(true)]);
    assert_eq!(
        to_string(&mixed)?,
        "<value><array><data><value><int>1</int></value><value><string>x</string></value><value><nil/></value><value><boolean>1</boolean></value></data></array></value>"
    );
    Ok(())
}

// ============================================================================
//  RECORDS
// ============================================================================

#[test]
fn test_struct_member_order() -> Result<()> {
    let s = Struct::new().member("z", 1).member("a", 2);
    assert_eq!(
        to_string(&s)?,
        "<value><struct><member><name>z</name><value><int>1</int></value></member><member><name>a</name><value><int>2</int></value></member></struct></value>"
    );
    Ok(())
}

#[test]
fn test_empty_struct() -> Result<()> {
    assert_eq!(to_string(&Struct::new())?, "<value><struct></struct></value>");
    Ok(())
}

#[test]
fn test_btreemap_as_struct() -> Result<()> {
    let mut map = BTreeMap::new();
    map.insert("b", 2);
    map.insert("a", 1);
    assert_eq!(
        to_string(&map)?,
        "<value><struct><member><name>a</name><value><int>1</int></value></member><member><name>b</name><value><int>2</int></value></member></struct></value>"
    );
    Ok(())
}

#[test]
fn test_member_name_is_escaped() -> Result<()> {
    let s = Struct::new().member("a&b", true);
    assert_eq!(
        to_string(&s)?,
        "<value><struct><member><name>a&amp;b</name><value><boolean>1</boolean></value></member></struct></value>"
    );
    Ok(())
}

#[test]
fn test_struct_helpers() {
    let s: Struct = [("x", 1), ("y", 2)].into_iter().collect();
    assert_eq!(s.len(), 2);
    assert!(matches!(s.get("y"), Some(Value::Int(2))));
    assert!(s.get("missing").is_none());
    let names: Vec<&str> = s.iter().map(|(n, _)| n).collect();
    assert_eq!(names, ["x", "y"]);
}

// ============================================================================
//  DISPATCH & CUSTOM
// ============================================================================

#[test]
fn test_value_categories() {
    assert_eq!(Value::from(1).category(), "int");
    assert_eq!(Value::from(1.5).category(), "double");
    assert_eq!(Value::from("s").category(), "string");
    assert_eq!(Value::from(true).category(), "boolean");
    assert_eq!(Value::from(Bytes::from("b")).category(), "base64");
    assert_eq!(Value::from(ts(2000, 1, 1, 0, 0, 0)).category(), "dateTime.iso8601");
    assert_eq!(Value::from(vec![1]).category(), "array");
    assert_eq!(Value::from(Struct::new()).category(), "struct");
    assert_eq!(Value::from(()).category(), "nil");
    assert_eq!(Value::custom(Raw("")).category(), "custom");
    assert!(Value::Nil.is_nil());
}

#[test]
fn test_custom_is_verbatim() -> Result<()> {
    let v = Value::custom(Raw("<value><i4>7</i4></value>"));
    assert_eq!(to_string(&v)?, "<value><i4>7</i4></value>");
    assert_eq!(to_string(&Custom(Raw("<value><nil/></value>")))?, "<value><nil/></value>");
    Ok(())
}

#[test]
fn test_custom_nested() -> Result<()> {
    let v = Value::Array(vec![Value::custom(Raw("<value><i4>7</i4></value>")), Value::Int(8)]);
    assert_eq!(
        to_string(&v)?,
        "<value><array><data><value><i4>7</i4></value><value><int>8</int></value></data></array></value>"
    );
    Ok(())
}

#[test]
fn test_custom_failure_top_level() {
    assert_eq!(to_string(&Custom(Failing)), Err(Error::Marshal("boom".into())));
}

#[test]
fn test_custom_failure_nested_propagates() {
    let v = Struct::new().member("ok", 1).member("bad", Value::Array(vec![Value::custom(Failing)]));
    assert_eq!(to_string(&v), Err(Error::Marshal("boom".into())));
    assert_eq!(encode_response(&v), Err(Error::Marshal("boom".into())));
}

#[test]
fn test_custom_invalid_utf8() {
    assert_eq!(to_string(&Value::custom(NotUtf8)), Err(Error::InvalidUtf8));
}

#[test]
fn test_custom_failure_writes_nothing() -> Result<()> {
    let mut enc = Encoder::new();
    enc.value_begin()?;
    enc.array_begin()?;
    assert!(enc.marshal(&Failing).is_err());
    enc.array_end()?;
    enc.value_end()?;
    assert_eq!(enc.into_string()?, "<value><array><data></data></array></value>");
    Ok(())
}

// ============================================================================
//  ENCODER STRUCTURE
// ============================================================================

#[test]
fn test_value_holds_one_payload() -> Result<()> {
    let mut enc = Encoder::new();
    enc.value_begin()?;
    enc.int(1)?;
    assert_eq!(enc.int(2), Err(Error::TooManyItems(Scope::Value)));
    enc.value_end()?;
    assert_eq!(enc.as_str()?, "<value><int>1</int></value>");
    Ok(())
}

#[test]
fn test_empty_value_rejected() -> Result<()> {
    let mut enc = Encoder::new();
    enc.value_begin()?;
    assert_eq!(enc.value_end(), Err(Error::EmptyScope(Scope::Value)));
    Ok(())
}

#[test]
fn test_open_scope_rejected() -> Result<()> {
    let mut enc = Encoder::new();
    enc.value_begin()?;
    enc.array_begin()?;
    assert_eq!(enc.scope(), Scope::Array);
    assert_eq!(enc.as_str(), Err(Error::ScopeStillOpen));
    assert!(matches!(enc.into_string(), Err(Error::ScopeStillOpen)));
    Ok(())
}

#[test]
fn test_scope_mismatch_and_underflow() -> Result<()> {
    let mut enc = Encoder::new();
    assert_eq!(enc.value_end(), Err(Error::ScopeUnderflow));
    enc.value_begin()?;
    enc.array_begin()?;
    assert_eq!(
        enc.struct_end(),
        Err(Error::ScopeMismatch { expected: Scope::Struct, actual: Scope::Array })
    );
    Ok(())
}

#[test]
fn test_unexpected_items() -> Result<()> {
    let mut enc = Encoder::new();
    enc.value_begin()?;
    enc.array_begin()?;
    assert_eq!(enc.int(1), Err(Error::UnexpectedItem { scope: Scope::Array, item: Item::Payload }));
    assert_eq!(
        enc.member_begin("x"),
        Err(Error::UnexpectedItem { scope: Scope::Array, item: Item::Member })
    );
    assert_eq!(
        enc.method_call_begin("m"),
        Err(Error::UnexpectedItem { scope: Scope::Array, item: Item::Envelope })
    );

    let mut enc = Encoder::new();
    enc.value_begin()?;
    enc.struct_begin()?;
    assert_eq!(enc.value_begin(), Err(Error::UnexpectedItem { scope: Scope::Struct, item: Item::Value }));
    Ok(())
}

#[test]
fn test_member_holds_one_value() -> Result<()> {
    let mut enc = Encoder::new();
    enc.value_begin()?;
    enc.struct_begin()?;
    enc.member_begin("a")?;
    1i32.encode(&mut enc)?;
    assert_eq!(2i32.encode(&mut enc), Err(Error::TooManyItems(Scope::Member)));
    enc.member_end()?;
    enc.struct_end()?;
    enc.value_end()?;
    assert_eq!(
        enc.into_string()?,
        "<value><struct><member><name>a</name><value><int>1</int></value></member></struct></value>"
    );
    Ok(())
}

#[test]
fn test_envelope_requires_params() -> Result<()> {
    let mut enc = Encoder::new();
    enc.method_response_begin()?;
    assert_eq!(enc.method_response_end(), Err(Error::EmptyScope(Scope::MethodResponse)));
    Ok(())
}

// ============================================================================
//  ENVELOPES
// ============================================================================

#[test]
fn test_request_end_to_end() -> Result<()> {
    assert_eq!(encode_request("Some.Method", &some_method_params())?, SOME_METHOD_XML);
    Ok(())
}

#[test]
fn test_response_special_chars() -> Result<()> {
    let params = Struct::new().member("String1", " & \" < > ");
    assert_eq!(
        encode_response(&params)?,
        "<methodResponse><params><param><value><string> &amp; &quot; &lt; &gt; </string></value></param></params></methodResponse>"
    );
    Ok(())
}

#[test]
fn test_response_nil() -> Result<()> {
    let params = Struct::new().member("Ptr", None::<i32>);
    assert_eq!(
        encode_response(&params)?,
        "<methodResponse><params><param><value><nil/></value></param></params></methodResponse>"
    );
    Ok(())
}

#[test]
fn test_method_name_is_escaped() -> Result<()> {
    assert_eq!(
        encode_request("a<b>&c", &())?,
        "<methodCall><methodName>a&lt;b&gt;&amp;c</methodName><params></params></methodCall>"
    );
    Ok(())
}

#[test]
fn test_tuple_params() -> Result<()> {
    assert_eq!(
        encode_request("math.add", &(1, 2.5))?,
        "<methodCall><methodName>math.add</methodName><params><param><value><int>1</int></value></param><param><value><double>2.500000</double></value></param></params></methodCall>"
    );
    assert_eq!(
        encode_response(&("ok",))?,
        "<methodResponse><params><param><value><string>ok</string></value></param></params></methodResponse>"
    );
    Ok(())
}

#[test]
fn test_envelope_into_shared_encoder() -> Result<()> {
    let params = (true,);
    let mut enc = Encoder::with_capacity(64);
    MethodCall::new("ping", &params).encode(&mut enc)?;
    assert_eq!(
        enc.into_string()?,
        "<methodCall><methodName>ping</methodName><params><param><value><boolean>1</boolean></value></param></params></methodCall>"
    );
    Ok(())
}

#[test]
fn test_encoding_is_deterministic_across_threads() -> Result<()> {
    let params = some_method_params();
    let first = encode_request("Some.Method", &params)?;
    let second = encode_request("Some.Method", &params)?;
    assert_eq!(first, second);

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| encode_request("Some.Method", &params)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), first);
        }
    });
    Ok(())
}
