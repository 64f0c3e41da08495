//! XML-RPC client over HTTP(S).
//!
//! Requests are sent as a `<methodCall>` POST body; `<methodResponse>` bodies
//! are decoded into `serde_json::Value`, and `<fault>` replies become
//! [`ImportError::Fault`]. Response text is decoded with the encoding declared
//! in the XML prolog (UTF-8 when absent).

use crate::domain::ports::{Connector, RpcTransport};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::{Map, Number, Value};
use std::time::Duration;

const CLIENT_AGENT: &str = concat!("glpi-import/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct XmlRpcClient {
    client: Client,
    endpoint: String,
    verbose: bool,
}

impl XmlRpcClient {
    pub fn new(endpoint: &str, timeout: Option<Duration>, verbose: bool) -> Result<Self> {
        validate_url("uri", endpoint)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.to_string(),
            verbose,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for XmlRpcClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = encode_call(method, std::slice::from_ref(&params));
        if self.verbose {
            tracing::debug!("XML-RPC request to {}: {}", self.endpoint, body);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .header(USER_AGENT, CLIENT_AGENT)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if self.verbose {
            tracing::debug!(
                "XML-RPC response ({}) for {}: {}",
                status,
                method,
                String::from_utf8_lossy(&bytes)
            );
        }

        if !status.is_success() {
            return Err(ImportError::HttpStatus {
                status: status.as_u16(),
            });
        }

        parse_response(&bytes)
    }
}

/// 建立 XML-RPC 用戶端的連線器
#[derive(Debug, Clone, Default)]
pub struct XmlRpcConnector {
    pub timeout: Option<Duration>,
    pub verbose: bool,
}

impl XmlRpcConnector {
    pub fn new(timeout: Option<Duration>, verbose: bool) -> Self {
        Self { timeout, verbose }
    }
}

impl Connector for XmlRpcConnector {
    type Transport = XmlRpcClient;

    fn open(&self, endpoint: &str) -> Result<XmlRpcClient> {
        XmlRpcClient::new(endpoint, self.timeout, self.verbose)
    }
}

pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    out.push_str("<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(param, &mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

fn encode_value(value: &Value, out: &mut String) {
    out.push_str("<value>");
    match value {
        Value::Null => out.push_str("<nil/>"),
        Value::Bool(b) => {
            out.push_str("<boolean>");
            out.push_str(if *b { "1" } else { "0" });
            out.push_str("</boolean>");
        }
        Value::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
            Some(i) => {
                out.push_str("<int>");
                out.push_str(&i.to_string());
                out.push_str("</int>");
            }
            // i4 放不下的整數也以 double 傳送
            None => {
                out.push_str("<double>");
                out.push_str(&n.as_f64().unwrap_or_default().to_string());
                out.push_str("</double>");
            }
        },
        Value::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(item, out);
            }
            out.push_str("</data></array>");
        }
        Value::Object(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(member, out);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn required_child(&self, name: &str) -> Result<&Element> {
        self.child(name).ok_or_else(|| {
            ImportError::protocol(format!("<{}> is missing a <{}> element", self.name, name))
        })
    }
}

fn parse_tree(xml: &[u8]) -> Result<Element> {
    // from_reader 會依 BOM 與 <?xml encoding="..."?> 選擇解碼器
    let mut reader = Reader::from_reader(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Element::named(e.local_name().as_ref())),
            Ok(Event::Empty(e)) => {
                attach(&mut stack, &mut root, Element::named(e.local_name().as_ref()))?
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ImportError::protocol("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| ImportError::protocol(format!("invalid text: {}", e)))?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|e| ImportError::protocol(format!("invalid CDATA: {}", e)))?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ImportError::protocol(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
    }

    if !stack.is_empty() {
        return Err(ImportError::protocol("unexpected end of XML document"));
    }
    root.ok_or_else(|| ImportError::protocol("empty XML-RPC response"))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ImportError::protocol("multiple root elements")),
    }
    Ok(())
}

/// 解析 `<methodResponse>`；`<fault>` 轉為 [`ImportError::Fault`]
pub fn parse_response(xml: &[u8]) -> Result<Value> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(ImportError::protocol(format!(
            "expected <methodResponse>, got <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let detail = decode_value(fault.required_child("value")?)?;
        let code = detail
            .get("faultCode")
            .and_then(Value::as_i64)
            .unwrap_or_default();
        let message = detail
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or("unknown fault")
            .to_string();
        return Err(ImportError::Fault { code, message });
    }

    // 沒有回傳參數時視同 nil
    match root.child("params").and_then(|p| p.child("param")) {
        Some(param) => decode_value(param.required_child("value")?),
        None => Ok(Value::Null),
    }
}

fn decode_value(element: &Element) -> Result<Value> {
    let typed = match element.children.first() {
        Some(typed) => typed,
        // 未標示型別的 <value> 依規範為字串
        None => return Ok(Value::String(element.text.clone())),
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "string" => Ok(Value::String(typed.text.clone())),
        "int" | "i4" | "i8" => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| ImportError::protocol(format!("invalid integer '{}': {}", text, e))),
        "boolean" => match text {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            other => Err(ImportError::protocol(format!("invalid boolean '{}'", other))),
        },
        "double" => {
            let number = text
                .parse::<f64>()
                .map_err(|e| ImportError::protocol(format!("invalid double '{}': {}", text, e)))?;
            Ok(Number::from_f64(number)
                .map(Value::Number)
                .unwrap_or(Value::Null))
        }
        "dateTime.iso8601" | "base64" => Ok(Value::String(text.to_string())),
        "nil" => Ok(Value::Null),
        "struct" => {
            let mut members = Map::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.required_child("name")?.text.clone();
                let value = decode_value(member.required_child("value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Object(members))
        }
        "array" => {
            let data = typed.required_child("data")?;
            data.children
                .iter()
                .filter(|c| c.name == "value")
                .map(decode_value)
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        other => Err(ImportError::protocol(format!(
            "unsupported XML-RPC type <{}>",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value_xml: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<methodResponse>\n  <params>\n    <param>\n      {}\n    </param>\n  </params>\n</methodResponse>",
            value_xml
        )
    }

    #[test]
    fn test_encode_call_with_struct_param() {
        let body = encode_call(
            "glpi.doLogin",
            &[json!({"login_name": "alignak", "login_password": "a<b&c"})],
        );

        assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><methodCall>"));
        assert!(body.contains("<methodName>glpi.doLogin</methodName>"));
        assert!(body.contains(
            "<member><name>login_name</name><value><string>alignak</string></value></member>"
        ));
        assert!(body.contains("<string>a&lt;b&amp;c</string>"));
        assert!(body.ends_with("</params></methodCall>"));
    }

    #[test]
    fn test_encode_scalars() {
        let body = encode_call("m", &[json!([1, true, null, 2.5, 10_000_000_000i64])]);
        assert!(body.contains("<value><int>1</int></value>"));
        assert!(body.contains("<value><boolean>1</boolean></value>"));
        assert!(body.contains("<value><nil/></value>"));
        assert!(body.contains("<value><double>2.5</double></value>"));
        assert!(body.contains("<value><double>10000000000</double></value>"));
    }

    #[test]
    fn test_request_is_readable_by_own_parser() {
        // methodCall 與 methodResponse 共用 value 結構
        let body = encode_call("m", &[json!({"session": "abc", "tag": " east "})]);
        let tree = parse_tree(body.as_bytes()).unwrap();
        let param = tree
            .child("params")
            .and_then(|p| p.child("param"))
            .unwrap();
        let value = decode_value(param.child("value").unwrap()).unwrap();
        assert_eq!(value, json!({"session": "abc", "tag": " east "}));
    }

    #[test]
    fn test_parse_login_response() {
        let xml = response(
            "<value><struct>\
               <member><name>session</name><value><string>0a1b2c</string></value></member>\
               <member><name>id</name><value><int>2</int></value></member>\
             </struct></value>",
        );
        let value = parse_response(xml.as_bytes()).unwrap();
        assert_eq!(value, json!({"session": "0a1b2c", "id": 2}));
    }

    #[test]
    fn test_parse_typed_values() {
        let xml = response(
            "<value><array><data>\
               <value>untyped</value>\
               <value><i4>-4</i4></value>\
               <value><boolean>0</boolean></value>\
               <value><double>1.5</double></value>\
               <value><dateTime.iso8601>20240101T10:00:00</dateTime.iso8601></value>\
               <value><base64>aGVsbG8=</base64></value>\
               <value><nil/></value>\
               <value><string>  padded  </string></value>\
               <value><string/></value>\
               <value><string>a &amp; b</string></value>\
             </data></array></value>",
        );
        let value = parse_response(xml.as_bytes()).unwrap();
        assert_eq!(
            value,
            json!([
                "untyped",
                -4,
                false,
                1.5,
                "20240101T10:00:00",
                "aGVsbG8=",
                null,
                "  padded  ",
                "",
                "a & b"
            ])
        );
    }

    #[test]
    fn test_parse_latin1_response_uses_declared_encoding() {
        let xml: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <methodResponse><params><param><value><struct>\
              <member><name>host_name</name><value><string>caf\xE9</string></value></member>\
              <member><name>notes</name><value><string><![CDATA[d\xE9j\xE0 vu]]></string></value></member>\
            </struct></value></param></params></methodResponse>";

        let value = parse_response(xml).unwrap();
        assert_eq!(value, json!({"host_name": "café", "notes": "déjà vu"}));
    }

    #[test]
    fn test_parse_utf8_response_without_declaration() {
        let xml = response("<value><string>café</string></value>");
        assert_eq!(parse_response(xml.as_bytes()).unwrap(), json!("café"));
    }

    #[test]
    fn test_parse_empty_array() {
        let xml = response("<value><array><data/></array></value>");
        assert_eq!(parse_response(xml.as_bytes()).unwrap(), json!([]));
    }

    #[test]
    fn test_parse_fault() {
        let xml = "<?xml version=\"1.0\"?>\
            <methodResponse><fault><value><struct>\
              <member><name>faultCode</name><value><int>13</int></value></member>\
              <member><name>faultString</name><value><string>session expired</string></value></member>\
            </struct></value></fault></methodResponse>";

        match parse_response(xml.as_bytes()) {
            Err(ImportError::Fault { code, message }) => {
                assert_eq!(code, 13);
                assert_eq!(message, "session expired");
            }
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_without_params_is_nil() {
        let xml = "<methodResponse><params/></methodResponse>";
        assert_eq!(parse_response(xml.as_bytes()).unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_malformed_responses() {
        assert!(matches!(
            parse_response(b"<html><body>Not found</body></html>"),
            Err(ImportError::Protocol { .. })
        ));
        assert!(matches!(
            parse_response(b"<methodResponse><params>"),
            Err(ImportError::Protocol { .. })
        ));
        assert!(matches!(
            parse_response(b""),
            Err(ImportError::Protocol { .. })
        ));
        assert!(matches!(
            parse_response(response("<value><int>abc</int></value>").as_bytes()),
            Err(ImportError::Protocol { .. })
        ));
    }

    #[test]
    fn test_connector_rejects_invalid_endpoint() {
        let connector = XmlRpcConnector::new(None, false);
        assert!(connector.open("not a url").is_err());
        assert!(connector.open("ftp://glpi.local/xmlrpc.php").is_err());

        let client = connector.open("http://glpi.local/xmlrpc.php").unwrap();
        assert_eq!(client.endpoint(), "http://glpi.local/xmlrpc.php");
    }
}
