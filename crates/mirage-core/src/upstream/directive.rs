//! PAC result parsing.

/// One recognized entry of a `FindProxyForURL` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDirective {
    Direct,
    /// `PROXY host:port`
    Proxy(String),
}

impl ProxyDirective {
    /// Parse a single directive. Unsupported kinds (`SOCKS`, `HTTPS`, ...)
    /// and malformed entries yield `None`.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split_whitespace();
        let keyword = parts.next()?;

        if keyword.eq_ignore_ascii_case("DIRECT") {
            return parts.next().is_none().then_some(ProxyDirective::Direct);
        }

        if keyword.eq_ignore_ascii_case("PROXY") {
            let address = parts.next()?;
            return parts
                .next()
                .is_none()
                .then(|| ProxyDirective::Proxy(address.to_string()));
        }

        None
    }
}

/// All recognized directives of a PAC result, in order.
pub fn parse_directives(result: &str) -> impl Iterator<Item = ProxyDirective> + '_ {
    result.split(';').filter_map(ProxyDirective::parse)
}

/// The directive the proxy acts on: the first recognized one.
pub fn first_directive(result: &str) -> Option<ProxyDirective> {
    parse_directives(result).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_directives() {
        assert_eq!(first_directive("DIRECT"), Some(ProxyDirective::Direct));
        assert_eq!(
            first_directive("PROXY 10.0.0.1:8080"),
            Some(ProxyDirective::Proxy("10.0.0.1:8080".to_string()))
        );
    }

    #[test]
    fn test_first_recognized_wins() {
        assert_eq!(
            first_directive("PROXY a:1; DIRECT"),
            Some(ProxyDirective::Proxy("a:1".to_string()))
        );
        assert_eq!(
            first_directive("SOCKS s:1080; DIRECT; PROXY a:1"),
            Some(ProxyDirective::Direct)
        );
    }

    #[test]
    fn test_whitespace_and_case() {
        assert_eq!(
            first_directive("  proxy   a:1  ;direct"),
            Some(ProxyDirective::Proxy("a:1".to_string()))
        );
        assert_eq!(first_directive(" ; DIRECT "), Some(ProxyDirective::Direct));
    }

    #[test]
    fn test_nothing_recognized() {
        assert_eq!(first_directive(""), None);
        assert_eq!(first_directive("SOCKS s:1080"), None);
        assert_eq!(first_directive("PROXY"), None);
        assert_eq!(first_directive("DIRECTLY"), None);
        assert_eq!(first_directive("PROXY a:1 b:2"), None);
    }

    #[test]
    fn test_all_directives_in_order() {
        let all: Vec<_> = parse_directives("PROXY a:1; SOCKS x; PROXY b:2; DIRECT").collect();
        assert_eq!(
            all,
            vec![
                ProxyDirective::Proxy("a:1".to_string()),
                ProxyDirective::Proxy("b:2".to_string()),
                ProxyDirective::Direct,
            ]
        );
    }
}
