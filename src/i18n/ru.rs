//! Russian translations

use super::Key;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static TRANSLATIONS: Lazy<HashMap<Key, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Common
    m.insert(Key::Error, "Ошибка");
    m.insert(Key::SignInRequired, "Необходимо войти в систему");
    m.insert(Key::LoadFailed, "Не удалось загрузить данные");

    // Playback
    m.insert(Key::PlaybackFailed, "Ошибка воспроизведения");
    m.insert(Key::PlaybackFailedDesc, "Не удалось воспроизвести трек");

    // Library
    m.insert(Key::AddedToLibrary, "Добавлено в библиотеку");
    m.insert(Key::AlreadyInLibrary, "Трек уже в библиотеке");
    m.insert(Key::AddToLibraryFailed, "Не удалось добавить в библиотеку");
    m.insert(Key::RemovedFromLibrary, "Удалено из библиотеки");
    m.insert(Key::RemoveFromLibraryFailed, "Не удалось удалить из библиотеки");

    // Friends
    m.insert(Key::UserNotFound, "Пользователь не найден");
    m.insert(Key::UserNotFoundDesc, "Проверьте правильность введенных данных");
    m.insert(Key::SelfRequest, "Нельзя добавить себя в друзья");
    m.insert(Key::RequestExists, "Заявка уже существует");
    m.insert(
        Key::RequestExistsDesc,
        "Вы уже отправили заявку или уже являетесь друзьями",
    );
    m.insert(Key::RequestSent, "Заявка отправлена");
    m.insert(Key::RequestSentDesc, "Заявка в друзья отправлена пользователю");
    m.insert(Key::RequestSendFailed, "Не удалось отправить заявку в друзья");
    m.insert(Key::RequestAccepted, "Заявка принята");
    m.insert(Key::RequestAcceptedDesc, "Заявка в друзья принята");
    m.insert(Key::RequestRejected, "Заявка отклонена");
    m.insert(Key::RequestRejectedDesc, "Заявка в друзья отклонена");
    m.insert(Key::RespondFailed, "Не удалось ответить на заявку");
    m.insert(Key::FriendRemoved, "Друг удален");
    m.insert(Key::FriendRemovedDesc, "Пользователь удален из списка друзей");
    m.insert(Key::RemoveFriendFailed, "Не удалось удалить друга");

    // Profile
    m.insert(Key::ProfileUpdated, "Профиль обновлен");
    m.insert(Key::ProfileUpdatedDesc, "Ваши изменения сохранены успешно.");
    m.insert(Key::ProfileUpdateFailed, "Не удалось обновить профиль");
    m.insert(Key::PlaylistCreated, "Плейлист создан");
    m.insert(Key::PlaylistCreatedDesc, "Новый плейлист успешно добавлен.");
    m.insert(Key::PlaylistCreateFailed, "Не удалось создать плейлист");
    m.insert(Key::PlaylistNameRequired, "Название плейлиста не может быть пустым");
    m.insert(Key::PlaylistDeleted, "Плейлист удален");
    m.insert(Key::PlaylistDeletedDesc, "Плейлист успешно удален.");
    m.insert(Key::PlaylistDeleteFailed, "Не удалось удалить плейлист");
    m.insert(Key::NotPlaylistOwner, "Удалить плейлист может только владелец");

    // Search & Wave
    m.insert(Key::EmptyQuery, "Введите запрос для поиска");
    m.insert(Key::SearchFailed, "Ошибка поиска");
    m.insert(Key::PreferencesSaved, "Настройки сохранены");
    m.insert(Key::PreferencesSaveFailed, "Не удалось сохранить настройки");

    // Recommendations
    m.insert(Key::ReasonPopularDark, "Популярно в темной музыке");
    m.insert(Key::ReasonDarkAmbient, "Темный эмбиент");
    m.insert(Key::ReasonSynthwave, "Синтвейв классика");
    m.insert(Key::ReasonCyberpunk, "Киберпанк атмосфера");
    m.insert(Key::ReasonDarkwave, "Энергичный дарквейв");
    m.insert(Key::ReasonGothic, "Готическая атмосфера");
    m.insert(Key::ReasonFromHistory, "На основе вашей истории");
    m.insert(Key::ReasonLikeYourTaste, "Похоже на ваши предпочтения");

    m
});

pub fn translations() -> &'static HashMap<Key, &'static str> {
    &TRANSLATIONS
}
