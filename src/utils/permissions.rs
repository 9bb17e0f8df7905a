use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Проверить доступ к устройствам ввода.
/// Без него работает только фоновый источник (медиаклавиши), поэтому
/// результат - предупреждение, а не ошибка запуска.
pub fn check_permissions() -> bool {
    info!("Проверка прав доступа...");

    let input_ok = check_input_devices_access(Path::new("/dev/input"));
    check_not_root();

    if input_ok {
        info!("Проверка прав доступа завершена успешно");
    } else {
        warn!("Нет доступа к устройствам ввода - останется только фоновый источник нажатий");
        for cmd in get_setup_commands() {
            warn!("   {}", cmd);
        }
    }

    input_ok
}

fn check_input_devices_access(input_dir: &Path) -> bool {
    if !input_dir.exists() {
        warn!("Директория {} не существует", input_dir.display());
        return false;
    }

    // Проверяем возможность чтения директории
    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", input_dir.display());
            true
        }
        Err(e) => {
            warn!("Нет доступа к {}: {}", input_dir.display(), e);
            false
        }
    }
}

fn check_not_root() {
    // Проверяем переменную окружения USER
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Рекомендуется добавить пользователя в группу 'input'");
            warn!("   и запускать приложение от имени обычного пользователя");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

/// Получить рекомендуемые команды для настройки прав доступа
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в группу input:".to_string(),
        "sudo usermod -a -G input $USER".to_string(),
        "# После выполнения команды перезайдите в систему".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_commands() {
        let commands = get_setup_commands();
        assert!(!commands.is_empty());
        assert!(commands.iter().any(|cmd| cmd.contains("usermod")));
    }

    #[test]
    fn test_missing_input_dir_is_not_accessible() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!check_input_devices_access(&dir.path().join("input")));
        assert!(check_input_devices_access(dir.path()));
    }
}
