//! Сборка VLESS-ссылки клиента из настроек inbound 3x-ui.

use crate::services::panel::{ClientLinkRequest, Inbound, PanelError};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
struct InboundSettings {
    #[serde(default)]
    clients: Vec<InboundClient>,
}

#[derive(Debug, Deserialize)]
struct InboundClient {
    #[serde(default)]
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    flow: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamSettings {
    network: Option<String>,
    security: Option<String>,
    reality_settings: Option<RealitySettings>,
    tls_settings: Option<TlsSettings>,
    ws_settings: Option<PathSettings>,
    http_upgrade_settings: Option<PathSettings>,
    xhttp_settings: Option<XhttpSettings>,
    grpc_settings: Option<GrpcSettings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealitySettings {
    #[serde(default)]
    server_names: Vec<String>,
    #[serde(default)]
    short_ids: Vec<String>,
    #[serde(default)]
    settings: RealityClientSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RealityClientSettings {
    #[serde(default)]
    public_key: String,
    #[serde(default)]
    fingerprint: String,
    #[serde(default)]
    spider_x: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TlsSettings {
    #[serde(default)]
    server_name: String,
    #[serde(default)]
    alpn: Vec<String>,
    #[serde(default)]
    settings: TlsClientSettings,
}

#[derive(Debug, Default, Deserialize)]
struct TlsClientSettings {
    #[serde(default)]
    fingerprint: String,
}

#[derive(Debug, Default, Deserialize)]
struct PathSettings {
    #[serde(default)]
    path: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    headers: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct XhttpSettings {
    #[serde(default)]
    path: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    mode: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrpcSettings {
    #[serde(default)]
    service_name: String,
}

/// Собрать ссылку `vless://` для клиента с указанным email.
///
/// `None`, если inbound не VLESS или клиента с таким email в нём нет.
pub fn build_client_link(
    inbound: &Inbound,
    request: &ClientLinkRequest<'_>,
) -> Result<Option<String>, PanelError> {
    if !inbound.protocol.eq_ignore_ascii_case("vless") {
        return Ok(None);
    }

    let settings: InboundSettings = parse_json(&inbound.settings, "settings")?;
    let Some(client) = settings
        .clients
        .iter()
        .find(|c| c.email == request.email && !c.id.is_empty())
    else {
        return Ok(None);
    };

    let stream: StreamSettings = parse_json(&inbound.stream_settings, "streamSettings")?;
    let network = stream.network.as_deref().unwrap_or("tcp");
    let security = stream.security.as_deref().unwrap_or("none");

    let mut params: Vec<(&str, String)> = vec![
        ("type", network.to_string()),
        ("security", security.to_string()),
    ];

    match security {
        "reality" => {
            let reality = stream.reality_settings.unwrap_or_default();
            params.push(("pbk", reality.settings.public_key));
            params.push(("fp", or_default(reality.settings.fingerprint, "chrome")));
            if let Some(sni) = reality.server_names.into_iter().find(|s| !s.is_empty()) {
                params.push(("sni", sni));
            }
            if let Some(sid) = reality.short_ids.into_iter().find(|s| !s.is_empty()) {
                params.push(("sid", sid));
            }
            if !reality.settings.spider_x.is_empty() {
                params.push(("spx", reality.settings.spider_x));
            }
        }
        "tls" => {
            let tls = stream.tls_settings.unwrap_or_default();
            let sni = or_default(tls.server_name, request.host);
            params.push(("sni", sni));
            params.push(("fp", or_default(tls.settings.fingerprint, "chrome")));
            if !tls.alpn.is_empty() {
                params.push(("alpn", tls.alpn.join(",")));
            }
        }
        _ => {}
    }

    match network {
        "ws" | "httpupgrade" => {
            let transport = match network {
                "ws" => stream.ws_settings,
                _ => stream.http_upgrade_settings,
            }
            .unwrap_or_default();
            let host = if transport.host.is_empty() {
                transport.headers.get("Host").cloned().unwrap_or_default()
            } else {
                transport.host
            };
            params.push(("path", or_default(transport.path, "/")));
            if !host.is_empty() {
                params.push(("host", host));
            }
        }
        "xhttp" => {
            let xhttp = stream.xhttp_settings.unwrap_or_default();
            params.push(("path", or_default(xhttp.path, "/")));
            if !xhttp.host.is_empty() {
                params.push(("host", xhttp.host));
            }
            if !xhttp.mode.is_empty() {
                params.push(("mode", xhttp.mode));
            }
        }
        "grpc" => {
            let grpc = stream.grpc_settings.unwrap_or_default();
            params.push(("serviceName", grpc.service_name));
        }
        _ => {}
    }

    if !client.flow.is_empty() {
        params.push(("flow", client.flow.clone()));
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(Some(format!(
        "vless://{}@{}:{}?{}#{}",
        client.id,
        request.host,
        request.port,
        query,
        urlencoding::encode(request.remark)
    )))
}

fn parse_json<T: for<'de> Deserialize<'de> + Default>(
    raw: &str,
    field: &str,
) -> Result<T, PanelError> {
    if raw.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(raw).map_err(|e| PanelError::Malformed(format!("{field}: {e}")))
}

fn or_default(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inbound(protocol: &str, stream: serde_json::Value) -> Inbound {
        Inbound {
            id: 3,
            remark: "Germany".into(),
            port: 443,
            protocol: protocol.into(),
            settings: json!({
                "clients": [
                    {"id": "11111111-2222-3333-4444-555555555555", "email": "alice", "flow": "xtls-rprx-vision"},
                    {"id": "99999999-2222-3333-4444-555555555555", "email": "bob", "flow": ""}
                ]
            })
            .to_string(),
            stream_settings: stream.to_string(),
        }
    }

    fn request<'a>(email: &'a str) -> ClientLinkRequest<'a> {
        ClientLinkRequest {
            email,
            host: "de.example.com",
            port: 443,
            remark: "Germany-alice",
        }
    }

    #[test]
    fn reality_link_carries_key_and_flow() {
        let inbound = inbound(
            "vless",
            json!({
                "network": "tcp",
                "security": "reality",
                "realitySettings": {
                    "serverNames": ["www.google.com"],
                    "shortIds": ["ab12"],
                    "settings": {"publicKey": "PUBKEY", "fingerprint": "firefox", "spiderX": ""}
                }
            }),
        );

        let link = build_client_link(&inbound, &request("alice")).unwrap().unwrap();
        assert_eq!(
            link,
            "vless://11111111-2222-3333-4444-555555555555@de.example.com:443\
             ?type=tcp&security=reality&pbk=PUBKEY&fp=firefox&sni=www.google.com&sid=ab12\
             &flow=xtls-rprx-vision#Germany-alice"
        );
    }

    #[test]
    fn empty_short_id_is_skipped() {
        let inbound = inbound(
            "vless",
            json!({
                "network": "tcp",
                "security": "reality",
                "realitySettings": {
                    "serverNames": ["www.google.com"],
                    "shortIds": ["", "cd34"],
                    "settings": {"publicKey": "PUBKEY"}
                }
            }),
        );

        let link = build_client_link(&inbound, &request("bob")).unwrap().unwrap();
        assert!(link.contains("&sid=cd34"));
        assert!(!link.contains("sid=&"));
    }

    #[test]
    fn tls_websocket_link_falls_back_to_host_for_sni() {
        let inbound = inbound(
            "vless",
            json!({
                "network": "ws",
                "security": "tls",
                "tlsSettings": {"serverName": "", "alpn": ["h2", "http/1.1"]},
                "wsSettings": {"path": "/ws", "headers": {"Host": "cdn.example.com"}}
            }),
        );

        let link = build_client_link(&inbound, &request("bob")).unwrap().unwrap();
        assert!(link.starts_with("vless://99999999-2222-3333-4444-555555555555@de.example.com:443?"));
        assert!(link.contains("sni=de.example.com"));
        assert!(link.contains("alpn=h2%2Chttp%2F1.1"));
        assert!(link.contains("path=%2Fws"));
        assert!(link.contains("host=cdn.example.com"));
        assert!(!link.contains("flow="));
    }

    #[test]
    fn unknown_client_or_protocol_gives_no_link() {
        let vless = inbound("vless", json!({"network": "tcp", "security": "none"}));
        assert!(build_client_link(&vless, &request("carol")).unwrap().is_none());

        let trojan = inbound("trojan", json!({"network": "tcp", "security": "none"}));
        assert!(build_client_link(&trojan, &request("alice")).unwrap().is_none());
    }

    #[test]
    fn broken_settings_json_is_an_error() {
        let mut broken = inbound("vless", json!({}));
        broken.settings = "{not json".into();
        assert!(matches!(
            build_client_link(&broken, &request("alice")),
            Err(PanelError::Malformed(_))
        ));
    }

    #[test]
    fn remark_is_percent_encoded() {
        let inbound = inbound("vless", json!({"network": "tcp", "security": "none"}));
        let req = ClientLinkRequest {
            remark: "Нидерланды-alice",
            ..request("alice")
        };
        let link = build_client_link(&inbound, &req).unwrap().unwrap();
        assert!(link.ends_with(&format!("#{}", urlencoding::encode("Нидерланды-alice"))));
    }
}
