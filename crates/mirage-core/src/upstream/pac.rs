//! Proxy auto-config (PAC) evaluation.
//!
//! Each evaluation runs in a fresh JavaScript context with the standard PAC
//! helper functions installed. `dnsResolve` only answers for IP literals and
//! `localhost`, so scripts never trigger network lookups.

use crate::error::PacError;
use boa_engine::{js_string, native_function::NativeFunction, Context, JsResult, JsValue, Source};
use std::net::IpAddr;
use tracing::trace;

const ENTRY_POINT: &str = "FindProxyForURL";

/// Standard PAC helpers expressible in plain JavaScript.
const PAC_HELPERS: &str = r#"
function isPlainHostName(host) {
    return String(host).indexOf('.') === -1;
}

function dnsDomainIs(host, domain) {
    host = String(host).toLowerCase();
    domain = String(domain).toLowerCase();
    return host.length >= domain.length &&
        host.substring(host.length - domain.length) === domain;
}

function localHostOrDomainIs(host, hostdom) {
    host = String(host).toLowerCase();
    hostdom = String(hostdom).toLowerCase();
    if (host === hostdom) {
        return true;
    }
    return host.indexOf('.') === -1 && hostdom.indexOf(host + '.') === 0;
}

function dnsDomainLevels(host) {
    return String(host).split('.').length - 1;
}

function shExpMatch(str, shexp) {
    var pattern = String(shexp)
        .replace(/[.+^${}()|[\]\\]/g, '\\$&')
        .replace(/\*/g, '.*')
        .replace(/\?/g, '.');
    return new RegExp('^' + pattern + '$').test(String(str));
}

function isResolvable(host) {
    return dnsResolve(host) !== null;
}

function __pacIpToInt(ip) {
    var b = String(ip).split('.');
    if (b.length !== 4) {
        return null;
    }
    return (((b[0] & 0xff) << 24) | ((b[1] & 0xff) << 16) |
        ((b[2] & 0xff) << 8) | (b[3] & 0xff)) >>> 0;
}

function isInNet(host, pattern, mask) {
    var ip = dnsResolve(host);
    if (ip === null) {
        return false;
    }
    var a = __pacIpToInt(ip);
    var p = __pacIpToInt(pattern);
    var m = __pacIpToInt(mask);
    if (a === null || p === null || m === null) {
        return false;
    }
    return ((a & m) >>> 0) === ((p & m) >>> 0);
}

function weekdayRange(wd1, wd2, gmt) {
    var days = ['SUN', 'MON', 'TUE', 'WED', 'THU', 'FRI', 'SAT'];
    if (wd2 === 'GMT') {
        gmt = wd2;
        wd2 = undefined;
    }
    var now = new Date();
    var today = gmt === 'GMT' ? now.getUTCDay() : now.getDay();
    var start = days.indexOf(String(wd1).toUpperCase());
    var end = wd2 === undefined ? start : days.indexOf(String(wd2).toUpperCase());
    if (start === -1 || end === -1) {
        return false;
    }
    return start <= end
        ? today >= start && today <= end
        : today >= start || today <= end;
}
"#;

/// A PAC script held as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacScript {
    source: String,
}

impl PacScript {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate `FindProxyForURL(url, host)` and return the raw result,
    /// e.g. `"PROXY 10.0.0.1:8080; DIRECT"`.
    pub fn find_proxy(&self, url: &str, host: &str) -> Result<String, PacError> {
        let mut context = Context::default();
        install_environment(&mut context)?;

        context
            .eval(Source::from_bytes(self.source.as_bytes()))
            .map_err(|e| PacError::Parse(e.to_string()))?;

        let global = context.global_object();
        let func = global
            .get(js_string!(ENTRY_POINT), &mut context)
            .map_err(|_| PacError::MissingEntryPoint)?;

        let result = func
            .as_callable()
            .ok_or(PacError::MissingEntryPoint)?
            .call(
                &JsValue::undefined(),
                &[
                    JsValue::from(js_string!(url.to_string())),
                    JsValue::from(js_string!(host.to_string())),
                ],
                &mut context,
            )
            .map_err(|e| PacError::Evaluation {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let directives = result
            .as_string()
            .map(|s| s.to_std_string_escaped())
            .ok_or_else(|| PacError::NonStringResult(result.display().to_string()))?;

        trace!(host, directives = %directives, "PAC script evaluated");
        Ok(directives)
    }
}

fn install_environment(context: &mut Context) -> Result<(), PacError> {
    register_function(context, "dnsResolve", dns_resolve)?;
    register_function(context, "myIpAddress", my_ip_address)?;
    context
        .eval(Source::from_bytes(PAC_HELPERS.as_bytes()))
        .map_err(|e| PacError::Parse(format!("PAC helpers: {e}")))?;
    Ok(())
}

fn register_function(
    context: &mut Context,
    name: &str,
    func: fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>,
) -> Result<(), PacError> {
    let global = context.global_object();
    global
        .set(
            js_string!(name),
            NativeFunction::from_fn_ptr(func).to_js_function(context.realm()),
            false,
            context,
        )
        .map_err(|e| PacError::Parse(format!("failed to install {name}: {e}")))?;
    Ok(())
}

/// Offline name resolution: IP literals resolve to themselves and
/// `localhost` to the loopback address. Everything else is unresolvable.
fn resolve_offline(host: &str) -> Option<String> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip.to_string());
    }
    host.eq_ignore_ascii_case("localhost")
        .then(|| "127.0.0.1".to_string())
}

fn dns_resolve(_this: &JsValue, args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
    let resolved = args
        .first()
        .and_then(|v| v.as_string())
        .map(|s| s.to_std_string_escaped())
        .and_then(|host| resolve_offline(&host));

    Ok(match resolved {
        Some(ip) => JsValue::from(js_string!(ip)),
        None => JsValue::null(),
    })
}

fn my_ip_address(_this: &JsValue, _args: &[JsValue], _ctx: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(js_string!("127.0.0.1")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(script: &str, host: &str) -> Result<String, PacError> {
        PacScript::new(script).find_proxy("", host)
    }

    #[test]
    fn test_direct_result() {
        let script = r#"function FindProxyForURL(url, host) { return "DIRECT"; }"#;
        assert_eq!(find(script, "example.com").unwrap(), "DIRECT");
    }

    #[test]
    fn test_host_dependent_result() {
        let script = r#"
            function FindProxyForURL(url, host) {
                if (dnsDomainIs(host, ".internal.corp")) {
                    return "DIRECT";
                }
                return "PROXY 10.0.0.1:8080; DIRECT";
            }
        "#;
        assert_eq!(find(script, "api.internal.corp").unwrap(), "DIRECT");
        assert_eq!(
            find(script, "example.com").unwrap(),
            "PROXY 10.0.0.1:8080; DIRECT"
        );
    }

    #[test]
    fn test_url_argument_is_passed() {
        let script = r#"function FindProxyForURL(url, host) { return "PROXY u" + url.length + ":1"; }"#;
        assert_eq!(find(script, "example.com").unwrap(), "PROXY u0:1");
    }

    #[test]
    fn test_helpers() {
        let script = r#"
            function FindProxyForURL(url, host) {
                var checks = [
                    isPlainHostName("intranet"),
                    !isPlainHostName("www.example.com"),
                    shExpMatch("api.example.com", "*.example.com"),
                    !shExpMatch("example.org", "*.example.com"),
                    shExpMatch("a1", "a?"),
                    localHostOrDomainIs("www", "www.example.com"),
                    dnsDomainLevels("a.b.c") === 2,
                    isInNet("10.1.2.3", "10.0.0.0", "255.0.0.0"),
                    !isInNet("192.168.1.1", "10.0.0.0", "255.0.0.0"),
                    !isInNet("unresolvable.example", "10.0.0.0", "255.0.0.0"),
                    isResolvable("localhost"),
                    !isResolvable("example.com"),
                    dnsResolve("localhost") === "127.0.0.1",
                    dnsResolve("example.com") === null,
                    myIpAddress() === "127.0.0.1"
                ];
                for (var i = 0; i < checks.length; i++) {
                    if (!checks[i]) {
                        return "FAILED " + i;
                    }
                }
                return "DIRECT";
            }
        "#;
        assert_eq!(find(script, "example.com").unwrap(), "DIRECT");
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = find("function FindProxyForURL(url, host) {", "example.com").unwrap_err();
        assert!(matches!(err, PacError::Parse(_)));
    }

    #[test]
    fn test_missing_entry_point() {
        let err = find("function other() { return 'DIRECT'; }", "example.com").unwrap_err();
        assert!(matches!(err, PacError::MissingEntryPoint));
    }

    #[test]
    fn test_runtime_error() {
        let script = r#"function FindProxyForURL(url, host) { return undefinedFn(); }"#;
        let err = find(script, "example.com").unwrap_err();
        assert!(matches!(err, PacError::Evaluation { .. }));
    }

    #[test]
    fn test_non_string_result() {
        let script = "function FindProxyForURL(url, host) { return 42; }";
        let err = find(script, "example.com").unwrap_err();
        assert!(matches!(err, PacError::NonStringResult(_)));
    }

    #[test]
    fn test_resolve_offline() {
        assert_eq!(resolve_offline("10.0.0.1").as_deref(), Some("10.0.0.1"));
        assert_eq!(resolve_offline("[::1]").as_deref(), Some("::1"));
        assert_eq!(resolve_offline("LOCALHOST").as_deref(), Some("127.0.0.1"));
        assert_eq!(resolve_offline("example.com"), None);
    }
}
