use crate::error::{Result, SosError};
use crate::sos_error;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, Proxy};

use super::{prepare, SmsSender};

const MM_DESTINATION: &str = "org.freedesktop.ModemManager1";
const MM_PATH: &str = "/org/freedesktop/ModemManager1";
const MM_MODEM_PREFIX: &str = "/org/freedesktop/ModemManager1/Modem/";
const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";
const MESSAGING_INTERFACE: &str = "org.freedesktop.ModemManager1.Modem.Messaging";
const SMS_INTERFACE: &str = "org.freedesktop.ModemManager1.Sms";

type ManagedObjects = HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>>;

/// Отправка через ModemManager на системной шине
pub struct ModemManagerSmsSender {
    modem_path: String,
    max_parts: usize,
    connection: OnceCell<Connection>,
}

impl ModemManagerSmsSender {
    pub fn new(modem_path: String, max_parts: usize) -> Self {
        info!("Инициализация ModemManagerSmsSender (модем: {})", modem_path);
        Self {
            modem_path,
            max_parts,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection> {
        Ok(self.connection.get_or_try_init(Connection::system).await?)
    }

    async fn resolve_modem(&self, connection: &Connection) -> Result<String> {
        if self.modem_path != "auto" {
            return Ok(self.modem_path.clone());
        }

        let proxy = Proxy::new(connection, MM_DESTINATION, MM_PATH, OBJECT_MANAGER_INTERFACE).await?;
        let objects: ManagedObjects = proxy
            .call("GetManagedObjects", &())
            .await
            .map_err(map_dbus_error)?;

        let paths: Vec<String> = objects.keys().map(|path| path.as_str().to_string()).collect();
        first_modem(paths)
            .ok_or_else(|| sos_error!(sms, "ModemManager не нашёл ни одного модема"))
    }

    async fn send_impl(&self, phone: &str, message: &str) -> Result<()> {
        let connection = self.connection().await?;
        let modem = self.resolve_modem(connection).await?;
        debug!("Отправка SMS через модем {}", modem);

        let messaging =
            Proxy::new(connection, MM_DESTINATION, modem.as_str(), MESSAGING_INTERFACE).await?;

        let mut properties: HashMap<&str, Value<'_>> = HashMap::new();
        properties.insert("number", Value::from(phone));
        properties.insert("text", Value::from(message));

        let sms_path: OwnedObjectPath = messaging
            .call("Create", &(properties,))
            .await
            .map_err(map_dbus_error)?;

        let sms = Proxy::new(connection, MM_DESTINATION, sms_path.as_str(), SMS_INTERFACE).await?;
        sms.call_method("Send", &()).await.map_err(map_dbus_error)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl SmsSender for ModemManagerSmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<usize> {
        let parts = prepare(phone, message, self.max_parts)?;

        // Склейку составного сообщения модем делает сам, передаём текст целиком
        self.send_impl(phone, message).await?;

        info!("SMS на {} отправлено ({} ч.)", phone, parts.len());
        Ok(parts.len())
    }
}

/// Первый модем по пути: выбор не зависит от порядка ответа шины
fn first_modem(paths: Vec<String>) -> Option<String> {
    let mut modems: Vec<String> = paths
        .into_iter()
        .filter(|path| path.starts_with(MM_MODEM_PREFIX))
        .collect();
    modems.sort();
    modems.into_iter().next()
}

fn map_dbus_error(error: zbus::Error) -> SosError {
    match &error {
        zbus::Error::MethodError(name, detail, _) => {
            let name = name.as_str();
            let detail = detail.clone().unwrap_or_default();
            if name.ends_with("AccessDenied") || name.ends_with("NotAuthorized") {
                sos_error!(permission, "{}: {}", name, detail)
            } else {
                sos_error!(sms, "{}: {}", name, detail)
            }
        }
        _ => sos_error!(sms, "{}", error),
    }
}
